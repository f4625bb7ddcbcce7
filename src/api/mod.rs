// Store price API access (RapidAPI product search endpoints).

mod client;

pub use client::{ENDPOINTS, StoreApi, StoreEndpoint, endpoint_for, extract_products, print_sample};
