use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("malformed OSM XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed OSM XML attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),
    #[error("no highway ways found in source")]
    NoHighways,
}
