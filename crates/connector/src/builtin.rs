//! Curated API list compiled into the binary.
//!
//! Used by the quick startup ingest and as the fallback whenever a remote
//! directory is unreachable. Rows mirror the public-apis directory columns.

use crate::raw::RawEntry;

/// (name, description, auth, https, cors, link, category)
type Row = (&'static str, &'static str, &'static str, bool, &'static str, &'static str, &'static str);

const CURATED: &[Row] = &[
    ("Dog CEO", "Random dog images", "", true, "yes", "https://dog.ceo/dog-api/", "Animals"),
    ("Cat Facts", "Daily cat facts", "", true, "no", "https://catfact.ninja/", "Animals"),
    ("JokeAPI", "Programming, miscellaneous and dark jokes", "", true, "yes", "https://sv443.net/jokeapi/v2/", "Entertainment"),
    ("Official Joke API", "Random jokes as JSON", "", true, "yes", "https://github.com/15Dkatz/official_joke_api", "Entertainment"),
    ("Chuck Norris Database", "Jokes", "", true, "unknown", "https://api.chucknorris.io", "Entertainment"),
    ("Useless Facts", "Random useless, but true facts", "", true, "unknown", "https://uselessfacts.jsph.pl/", "Entertainment"),
    ("Open-Meteo", "Global weather forecast API for non-commercial use", "", true, "yes", "https://open-meteo.com/", "Weather"),
    ("OpenWeatherMap", "Weather", "apiKey", true, "unknown", "https://openweathermap.org/api", "Weather"),
    ("Weatherstack", "Real-Time & Historical World Weather Data API", "apiKey", false, "unknown", "https://weatherstack.com/", "Weather"),
    ("REST Countries", "Get information about countries via a RESTful API", "", true, "yes", "https://restcountries.com", "Geocoding"),
    ("Zippopotam.us", "Get information about place such as country, city, state, etc", "", false, "unknown", "http://www.zippopotam.us", "Geocoding"),
    ("IP-API", "Find location with IP address or domain", "", false, "unknown", "https://ip-api.com/docs", "Geocoding"),
    ("Sunrise and Sunset", "Sunset and sunrise times for a given latitude and longitude", "", true, "no", "https://sunrise-sunset.org/api", "Science & Math"),
    ("Numbers", "Number of the day, random number, number facts and anything else you want to do with numbers", "", false, "no", "http://numbersapi.com", "Science & Math"),
    ("NASA", "NASA data, including imagery", "apiKey", true, "no", "https://api.nasa.gov", "Science & Math"),
    ("PokeAPI", "All the Pokemon data you'll ever need", "", true, "unknown", "https://pokeapi.co", "Games & Comics"),
    ("Deck of Cards", "Deck of Cards", "", true, "unknown", "https://deckofcardsapi.com/", "Games & Comics"),
    ("Agify.io", "Estimates the age from a first name", "", true, "yes", "https://agify.io", "Open Data"),
    ("Genderize.io", "Estimates a gender from a first name", "", true, "yes", "https://genderize.io", "Open Data"),
    ("Nationalize.io", "Estimate the nationality of a first name", "", true, "yes", "https://nationalize.io", "Open Data"),
    ("Advice Slip", "Generate random advice slips", "", true, "unknown", "https://api.adviceslip.com/", "Personality"),
    ("Kanye.rest", "REST API for random Kanye West quotes", "", true, "yes", "https://kanye.rest", "Personality"),
    ("CoinGecko", "Cryptocurrency Price, Market, and Developer/Social Data", "", true, "yes", "https://www.coingecko.com/api", "Cryptocurrency"),
    ("Frankfurter", "Exchange rates, currency conversion and time series", "", true, "yes", "https://www.frankfurter.app/docs", "Currency Exchange"),
    ("Open Library", "Books, book covers and related data", "", true, "no", "https://openlibrary.org/developers/api", "Books"),
    ("Random User", "Generates and list user data", "", true, "unknown", "https://randomuser.me", "Test Data"),
    ("Open Brewery DB", "Breweries, Cideries and Craft Beer Bottle Shops", "", true, "yes", "https://www.openbrewerydb.org", "Food & Drink"),
    ("ipify", "A simple IP Address API", "", true, "unknown", "https://www.ipify.org/", "Development"),
    ("GitHub", "Make use of GitHub repositories, code and user activity programmatically", "OAuth", true, "yes", "https://docs.github.com/en/rest", "Development"),
    ("Spotify", "View Spotify music catalog, manage users' libraries, get recommendations and more", "OAuth", true, "unknown", "https://developer.spotify.com/documentation/web-api/", "Music"),
];

/// The curated list as raw entries. Never empty.
pub fn curated_entries() -> Vec<RawEntry> {
    CURATED
        .iter()
        .map(|(name, description, auth, https, cors, link, category)| RawEntry {
            name: Some(name.to_string()),
            description: Some(description.to_string()),
            auth: Some(auth.to_string()),
            https: Some(*https),
            cors: Some(cors.to_string()),
            link: Some(link.to_string()),
            category: Some(category.to_string()),
        })
        .collect()
}
