// Port configuration
pub const DEFAULT_PORT: u16 = 3001;

// Outbound services
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8081";
pub const DEFAULT_RADIO_DIRECTORY_URL: &str = "https://at1.api.radio-browser.info";
pub const DEFAULT_RADIO_COUNTRY: &str = "PL";
pub const DEFAULT_RADIO_LIMIT: u32 = 1000;

// Home viewport (center of Poland)
pub const HOME_LAT: f64 = 51.7470;
pub const HOME_LNG: f64 = 19.8056;
pub const HOME_ZOOM: f64 = 6.0;

// Selection behaviour
pub const SELECTION_ZOOM: f64 = 12.0;
pub const SEARCH_FLY_DURATION_MS: u64 = 800;
pub const RADIO_RADIUS_KM: f64 = 20.0;
// A flight that ends farther than this from its target was interrupted
pub const LANDING_TOLERANCE_KM: f64 = 0.5;

// Country boundary overlay: everything except the focus country is dimmed
pub const DEFAULT_BOUNDARIES_URL: &str =
    "https://raw.githubusercontent.com/datasets/geo-countries/master/data/countries.geojson";
pub const DEFAULT_FOCUS_COUNTRY: &str = "POL";
pub const BOUNDARY_FILL_COLOR: &str = "#cccccc";
pub const BOUNDARY_FILL_OPACITY: f64 = 0.2;

// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// Legend form constraints
pub const NAME_MIN_CHARS: usize = 3;
pub const DESCRIPTION_MIN_CHARS: usize = 50;
pub const DEFAULT_CATEGORY_ID: i64 = 1;

// Marker colors, matching the map page stylesheet
pub const LEGEND_MARKER_COLOR: &str = "green";
pub const CENTER_MARKER_COLOR: &str = "red";

// SSE
pub const EVENT_CHANNEL_CAPACITY: usize = 100;
pub const HEARTBEAT_SECS: u64 = 30;
