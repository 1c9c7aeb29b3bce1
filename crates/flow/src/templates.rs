/// One step of a template: a directory API name and one of its operations.
#[derive(Debug, Clone, Copy)]
pub struct TemplateStep {
    pub api: &'static str,
    pub operation: &'static str,
    pub description: &'static str,
    pub optional: bool,
    pub params: &'static [(&'static str, &'static str)],
}

#[derive(Debug, Clone, Copy)]
pub struct FlowTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub categories: &'static [&'static str],
    pub steps: &'static [TemplateStep],
}

const fn step(api: &'static str, operation: &'static str, description: &'static str) -> TemplateStep {
    TemplateStep { api, operation, description, optional: false, params: &[] }
}

const fn optional(api: &'static str, operation: &'static str, description: &'static str) -> TemplateStep {
    TemplateStep { api, operation, description, optional: true, params: &[] }
}

const fn with_params(mut s: TemplateStep, params: &'static [(&'static str, &'static str)]) -> TemplateStep {
    s.params = params;
    s
}

pub const FLOW_TEMPLATES: &[FlowTemplate] = &[
    FlowTemplate {
        id: "weather-and-joke",
        name: "Weather and a Joke",
        description: "Current weather in Berlin followed by a joke",
        categories: &["Weather", "Entertainment"],
        steps: &[
            with_params(
                step("Open-Meteo", "forecast", "Current weather"),
                &[("latitude", "52.52"), ("longitude", "13.41"), ("current_weather", "true")],
            ),
            step("JokeAPI", "random", "A joke to go with it"),
        ],
    },
    FlowTemplate {
        id: "pet-break",
        name: "Pet Break",
        description: "A dog picture and a cat fact",
        categories: &["Animals"],
        steps: &[
            step("Dog CEO", "random", "Random dog picture"),
            step("Cat Facts", "fact", "Random cat fact"),
        ],
    },
    FlowTemplate {
        id: "daily-inspiration",
        name: "Daily Inspiration",
        description: "Advice, a quote and a useless fact",
        categories: &["Personality", "Entertainment"],
        steps: &[
            step("Advice Slip", "random", "A piece of advice"),
            optional("Kanye.rest", "quote", "A quote"),
            optional("Useless Facts", "random", "A useless fact"),
        ],
    },
    FlowTemplate {
        id: "name-insights",
        name: "Name Insights",
        description: "Predicted age, gender and nationality for a first name",
        categories: &["Open Data"],
        steps: &[
            step("Agify.io", "predict", "Predicted age"),
            step("Genderize.io", "predict", "Predicted gender"),
            step("Nationalize.io", "predict", "Predicted nationality"),
        ],
    },
    FlowTemplate {
        id: "crypto-snapshot",
        name: "Crypto Snapshot",
        description: "Trending coins, BTC/ETH prices and fiat rates",
        categories: &["Cryptocurrency", "Currency Exchange"],
        steps: &[
            step("CoinGecko", "trending", "Trending coins"),
            with_params(
                step("CoinGecko", "price", "Bitcoin and Ethereum in USD"),
                &[("ids", "bitcoin,ethereum"), ("vs_currencies", "usd")],
            ),
            optional("Frankfurter", "latest", "Latest fiat exchange rates"),
        ],
    },
    FlowTemplate {
        id: "fun-facts",
        name: "Fun Facts",
        description: "Number trivia, the useless fact of the day and a Chuck Norris fact",
        categories: &["Science & Math", "Entertainment"],
        steps: &[
            step("Numbers", "random", "Trivia about a random number"),
            step("Useless Facts", "today", "Useless fact of the day"),
            step("Chuck Norris Database", "random", "A Chuck Norris fact"),
        ],
    },
    FlowTemplate {
        id: "country-explorer",
        name: "Country Explorer",
        description: "Country details and the currencies they might use",
        categories: &["Geocoding", "Currency Exchange"],
        steps: &[
            step("REST Countries", "by_name", "Country details"),
            optional("Frankfurter", "currencies", "Known currencies"),
        ],
    },
    FlowTemplate {
        id: "game-night",
        name: "Game Night",
        description: "A fresh deck, a Pokemon and a joke",
        categories: &["Games & Comics", "Entertainment"],
        steps: &[
            step("Deck of Cards", "new_deck", "Shuffle a new deck"),
            with_params(optional("PokeAPI", "pokemon", "Look up a Pokemon"), &[("name", "pikachu")]),
            step("Official Joke API", "random", "A joke between rounds"),
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn template_ids_are_unique_and_non_trivial() {
        let ids: HashSet<_> = FLOW_TEMPLATES.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), FLOW_TEMPLATES.len());
        assert!(FLOW_TEMPLATES.iter().all(|t| t.steps.len() >= 2));
        assert!(FLOW_TEMPLATES.iter().all(|t| t.steps.iter().any(|s| !s.optional)));
    }
}
