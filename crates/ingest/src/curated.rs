//! Curated knowledge about well-known APIs whose directory link does not
//! point at the callable host, plus their real operations.
//!
//! Lookups are by exact directory name.

use std::collections::BTreeMap;

use apiloom_core::{EndpointDef, HttpMethod, ParamSpec};

const BASE_URLS: &[(&str, &str)] = &[
    ("Dog CEO", "https://dog.ceo/api"),
    ("Cat Facts", "https://catfact.ninja"),
    ("JokeAPI", "https://v2.jokeapi.dev"),
    ("Official Joke API", "https://official-joke-api.appspot.com"),
    ("Chuck Norris Database", "https://api.chucknorris.io"),
    ("Useless Facts", "https://uselessfacts.jsph.pl/api/v2"),
    ("Open-Meteo", "https://api.open-meteo.com/v1"),
    ("OpenWeatherMap", "https://api.openweathermap.org/data/2.5"),
    ("Weatherstack", "http://api.weatherstack.com"),
    ("REST Countries", "https://restcountries.com/v3.1"),
    ("Zippopotam.us", "http://api.zippopotam.us"),
    ("IP-API", "http://ip-api.com"),
    ("Sunrise and Sunset", "https://api.sunrise-sunset.org"),
    ("Numbers", "http://numbersapi.com"),
    ("NASA", "https://api.nasa.gov"),
    ("PokeAPI", "https://pokeapi.co/api/v2"),
    ("Deck of Cards", "https://deckofcardsapi.com/api"),
    ("Agify.io", "https://api.agify.io"),
    ("Genderize.io", "https://api.genderize.io"),
    ("Nationalize.io", "https://api.nationalize.io"),
    ("Advice Slip", "https://api.adviceslip.com"),
    ("Kanye.rest", "https://api.kanye.rest"),
    ("CoinGecko", "https://api.coingecko.com/api/v3"),
    ("Frankfurter", "https://api.frankfurter.app"),
    ("Open Library", "https://openlibrary.org"),
    ("Random User", "https://randomuser.me/api"),
    ("Open Brewery DB", "https://api.openbrewerydb.org/v1"),
    ("ipify", "https://api.ipify.org"),
    ("GitHub", "https://api.github.com"),
    ("Spotify", "https://api.spotify.com/v1"),
];

/// (name, type, required, description)
type Param = (&'static str, &'static str, bool, &'static str);

struct Op {
    name: &'static str,
    path: &'static str,
    method: HttpMethod,
    description: &'static str,
    params: &'static [Param],
}

const fn get(name: &'static str, path: &'static str, description: &'static str, params: &'static [Param]) -> Op {
    Op { name, path, method: HttpMethod::Get, description, params }
}

const NAME_PARAM: &[Param] = &[("name", "string", true, "First name to analyse"), ("country_id", "string", false, "ISO 3166-1 alpha-2 country hint")];

const ENDPOINTS: &[(&str, &[Op])] = &[
    ("Dog CEO", &[
        get("random", "/breeds/image/random", "Random dog image", &[]),
        get("by_breed", "/breed/{breed}/images/random", "Random image of a breed", &[("breed", "string", true, "Breed name, e.g. hound")]),
        get("list_breeds", "/breeds/list/all", "All breeds and sub-breeds", &[]),
    ]),
    ("Cat Facts", &[
        get("fact", "/fact", "A random cat fact", &[("max_length", "integer", false, "Maximum fact length")]),
        get("facts", "/facts", "A page of cat facts", &[("limit", "integer", false, "Page size")]),
        get("breeds", "/breeds", "Cat breeds", &[("limit", "integer", false, "Page size")]),
    ]),
    ("JokeAPI", &[
        get("random", "/joke/Any", "A random joke from any category", &[("safe-mode", "boolean", false, "Exclude offensive jokes")]),
        get("by_category", "/joke/{category}", "A joke from one category", &[("category", "string", true, "Programming, Misc, Pun, Spooky or Christmas")]),
    ]),
    ("Official Joke API", &[
        get("random", "/random_joke", "One random joke", &[]),
        get("ten", "/jokes/ten", "Ten random jokes", &[]),
    ]),
    ("Chuck Norris Database", &[
        get("random", "/jokes/random", "A random Chuck Norris fact", &[("category", "string", false, "Restrict to a category")]),
        get("categories", "/jokes/categories", "Joke categories", &[]),
    ]),
    ("Useless Facts", &[
        get("random", "/facts/random", "A random useless fact", &[("language", "string", false, "en or de")]),
        get("today", "/facts/today", "Useless fact of the day", &[]),
    ]),
    ("Open-Meteo", &[
        get("forecast", "/forecast", "Weather forecast for a coordinate", &[
            ("latitude", "number", true, "Latitude in degrees"),
            ("longitude", "number", true, "Longitude in degrees"),
            ("current_weather", "boolean", false, "Include current conditions"),
        ]),
    ]),
    ("OpenWeatherMap", &[
        get("current", "/weather", "Current weather for a city", &[("q", "string", true, "City name"), ("appid", "string", true, "API key")]),
    ]),
    ("REST Countries", &[
        get("by_name", "/name/{name}", "Countries matching a name", &[("name", "string", true, "Country name")]),
        get("by_code", "/alpha/{code}", "Country by ISO code", &[("code", "string", true, "ISO 3166 code")]),
        get("by_region", "/region/{region}", "Countries in a region", &[("region", "string", true, "Region, e.g. europe")]),
    ]),
    ("Zippopotam.us", &[
        get("lookup", "/{country}/{postcode}", "Places for a postal code", &[
            ("country", "string", true, "ISO country code"),
            ("postcode", "string", true, "Postal code"),
        ]),
    ]),
    ("IP-API", &[
        get("lookup", "/json/{query}", "Geolocation of an IP or domain", &[("query", "string", true, "IP address or domain")]),
    ]),
    ("Sunrise and Sunset", &[
        get("times", "/json", "Sunrise and sunset times", &[("lat", "number", true, "Latitude"), ("lng", "number", true, "Longitude")]),
    ]),
    ("Numbers", &[
        get("trivia", "/{number}/trivia", "Trivia about a number", &[("number", "integer", true, "The number")]),
        get("random", "/random/trivia", "Trivia about a random number", &[]),
    ]),
    ("NASA", &[
        get("apod", "/planetary/apod", "Astronomy picture of the day", &[("api_key", "string", true, "NASA API key")]),
    ]),
    ("PokeAPI", &[
        get("pokemon", "/pokemon/{name}", "A Pokemon by name or id", &[("name", "string", true, "Name or id")]),
        get("type", "/type/{name}", "A Pokemon type", &[("name", "string", true, "Type name")]),
    ]),
    ("Deck of Cards", &[
        get("new_deck", "/deck/new/shuffle/", "A freshly shuffled deck", &[("deck_count", "integer", false, "Number of decks")]),
        get("draw", "/deck/{deck_id}/draw/", "Draw cards from a deck", &[("deck_id", "string", true, "Deck id"), ("count", "integer", false, "Cards to draw")]),
    ]),
    ("Agify.io", &[get("predict", "/", "Predicted age for a name", NAME_PARAM)]),
    ("Genderize.io", &[get("predict", "/", "Predicted gender for a name", NAME_PARAM)]),
    ("Nationalize.io", &[get("predict", "/", "Predicted nationality for a name", &[("name", "string", true, "First name to analyse")])]),
    ("Advice Slip", &[
        get("random", "/advice", "A random advice slip", &[]),
        get("search", "/advice/search/{query}", "Advice slips matching a term", &[("query", "string", true, "Search term")]),
    ]),
    ("Kanye.rest", &[get("quote", "/", "A random Kanye West quote", &[])]),
    ("CoinGecko", &[
        get("price", "/simple/price", "Spot prices for coins", &[
            ("ids", "string", true, "Comma-separated coin ids"),
            ("vs_currencies", "string", true, "Comma-separated fiat currencies"),
        ]),
        get("trending", "/search/trending", "Trending coins", &[]),
        get("ping", "/ping", "API status", &[]),
    ]),
    ("Frankfurter", &[
        get("latest", "/latest", "Latest exchange rates", &[("from", "string", false, "Base currency"), ("to", "string", false, "Target currencies")]),
        get("currencies", "/currencies", "Supported currencies", &[]),
    ]),
    ("Open Library", &[
        get("search", "/search.json", "Search books", &[("q", "string", true, "Query"), ("limit", "integer", false, "Max results")]),
    ]),
    ("Random User", &[get("generate", "/", "Random user profiles", &[("results", "integer", false, "Number of users")])]),
    ("Open Brewery DB", &[
        get("list", "/breweries", "Breweries", &[("by_city", "string", false, "City filter"), ("per_page", "integer", false, "Page size")]),
        get("random", "/breweries/random", "A random brewery", &[]),
    ]),
    ("ipify", &[get("ip", "/", "Caller's public IP", &[("format", "string", false, "json or text")])]),
    ("GitHub", &[
        get("user", "/users/{username}", "Public profile of a user", &[("username", "string", true, "GitHub login")]),
        get("repo", "/repos/{owner}/{repo}", "Repository metadata", &[("owner", "string", true, "Owner"), ("repo", "string", true, "Repository")]),
    ]),
];

pub fn curated_base_url(name: &str) -> Option<&'static str> {
    BASE_URLS.iter().find(|(n, _)| *n == name).map(|(_, url)| *url)
}

pub fn curated_endpoints(name: &str) -> Option<Vec<EndpointDef>> {
    let (_, ops) = ENDPOINTS.iter().find(|(n, _)| *n == name)?;
    Some(ops.iter().map(to_def).collect())
}

fn to_def(op: &Op) -> EndpointDef {
    let parameters = if op.params.is_empty() {
        None
    } else {
        Some(
            op.params
                .iter()
                .map(|(name, kind, required, description)| {
                    let spec = if *required {
                        ParamSpec::required(kind, description)
                    } else {
                        ParamSpec::optional(kind, description)
                    };
                    (name.to_string(), spec)
                })
                .collect::<BTreeMap<_, _>>(),
        )
    };
    EndpointDef {
        name: op.name.to_string(),
        path: op.path.to_string(),
        method: op.method,
        description: op.description.to_string(),
        parameters,
        sample_response: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_placeholders_are_declared_required() {
        for (api, ops) in ENDPOINTS {
            for op in *ops {
                let def = to_def(op);
                let required = def.required_params();
                let mut rest = def.path.as_str();
                while let Some(start) = rest.find('{') {
                    let end = rest[start..].find('}').expect("unclosed placeholder") + start;
                    let token = &rest[start + 1..end];
                    assert!(required.contains(&token), "{api}.{} does not require {token}", op.name);
                    rest = &rest[end + 1..];
                }
            }
        }
    }

    #[test]
    fn every_endpoint_table_has_a_base_url() {
        for (api, _) in ENDPOINTS {
            assert!(curated_base_url(api).is_some(), "{api} has no base url");
        }
    }

    #[test]
    fn lookup_is_exact() {
        assert!(curated_endpoints("Dog CEO").is_some());
        assert!(curated_endpoints("dog ceo").is_none());
        assert_eq!(curated_base_url("Open-Meteo"), Some("https://api.open-meteo.com/v1"));
    }
}
