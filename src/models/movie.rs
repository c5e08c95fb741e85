use serde::Serialize;

/// Title used when the booking form does not name a movie.
pub const DEFAULT_MOVIE: &str = "Example Movie";

/// A movie on the listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Movie {
    pub title: &'static str,
    pub genre: &'static str,
}

/// Everything currently showing.
pub const CATALOGUE: &[Movie] = &[
    Movie { title: "The Grand Premiere", genre: "Drama" },
    Movie { title: "Laugh Riot", genre: "Comedy" },
    Movie { title: "Edge of Tomorrow", genre: "Action" },
    Movie { title: "Haunted Nights", genre: "Horror" },
];

/// Looks up a showing movie by its exact title.
pub fn find(title: &str) -> Option<&'static Movie> {
    CATALOGUE.iter().find(|movie| movie.title == title)
}
