use crate::model::GeoPoint;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Option<Geometry>,
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Option<LatLng>,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    #[serde(default)]
    types: Vec<String>,
}

/// What the geocoder knows about an address
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeocodeHit {
    pub location: Option<GeoPoint>,
    pub district: Option<String>,
}

/// Geocodes one address, biased to Vietnam and answering in Vietnamese
///
/// `Ok(None)` means the geocoder had no result; `Err` carries a transport,
/// status or decode failure.
pub async fn geocode_address(
    client: &Client,
    endpoint: &str,
    api_key: &str,
    address: &str,
) -> Result<Option<GeocodeHit>, String> {
    let response = client
        .get(endpoint)
        .query(&[
            ("address", address),
            ("key", api_key),
            ("region", "VN"),
            ("language", "vi"),
        ])
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("Geocode failed: {}", status.as_u16()));
    }

    let body: GeocodeResponse = response.json().await.map_err(|e| e.to_string())?;
    Ok(body.results.into_iter().next().map(into_hit))
}

fn into_hit(result: GeocodeResult) -> GeocodeHit {
    let location = result
        .geometry
        .and_then(|g| g.location)
        .map(|loc| GeoPoint {
            lng: loc.lng,
            lat: loc.lat,
        });

    let district = result
        .address_components
        .into_iter()
        .find(|c| {
            c.types
                .iter()
                .any(|t| t == "sublocality_level_1" || t == "administrative_area_level_2")
        })
        .map(|c| c.long_name)
        .filter(|name| !name.is_empty());

    GeocodeHit { location, district }
}
