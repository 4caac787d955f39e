//! Places.

use crate::request::RequestDescriptor;

/// `GET geo/id/:place_id`
pub fn place(place_id: &str) -> RequestDescriptor {
    RequestDescriptor::get("geo/id/{place_id}.json")
        .path("place_id", place_id)
        .build()
}

/// `GET geo/search` around a coordinate.
pub fn search(lat: f64, long: f64, max_results: Option<u32>) -> RequestDescriptor {
    RequestDescriptor::get("geo/search.json")
        .required("lat", lat)
        .required("long", long)
        .optional("max_results", max_results)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_binds_coordinates() {
        let base = url::Url::parse("https://api.twitter.com/1.1").unwrap();
        let url = search(37.7821, -122.4, Some(3)).url(&base).unwrap();
        assert_eq!(url.query(), Some("lat=37.7821&long=-122.4&max_results=3"));
    }

    #[test]
    fn place_substitutes_id() {
        assert_eq!(
            place("df51dec6f4ee2b2c").render_path().unwrap(),
            "geo/id/df51dec6f4ee2b2c.json"
        );
    }
}
