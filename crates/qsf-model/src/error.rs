use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    /// Two answer keys collapsed onto the same normalized key and both carried data.
    ///
    /// Merging them would silently drop one respondent answer, so the response
    /// cannot be represented in a flat table.
    #[error(
        "duplicate answer for '{key}' (raw key '{raw_key}'): already have '{existing}', refusing to overwrite with '{incoming}'"
    )]
    DuplicateAnswer {
        key: String,
        raw_key: String,
        existing: String,
        incoming: String,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;
