use std::collections::HashMap;

use actix_web::http::StatusCode;
use actix_web::ResponseError;
use thiserror::Error;

pub type QueryParams = HashMap<String, String>;

/// Rejected query strings. Both variants answer 403 with a plain text message.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParamError {
    #[error("Request failed - parameters missing.")]
    Missing,

    #[error("Incorrect parameters - provide numbers.")]
    NotANumber,
}

impl ResponseError for ParamError {
    fn status_code(&self) -> StatusCode {
        StatusCode::FORBIDDEN
    }
}

/// Reads the named parameters as numbers, in order. Presence of every name is
/// checked before any value is parsed.
pub fn require_numbers<const N: usize>(
    params: &QueryParams,
    names: [&str; N],
) -> Result<[f64; N], ParamError> {
    if names.iter().any(|name| !params.contains_key(*name)) {
        return Err(ParamError::Missing);
    }
    let mut values = [0.0; N];
    for (value, name) in values.iter_mut().zip(names) {
        *value = params[name]
            .trim()
            .parse::<f64>()
            .map_err(|_| ParamError::NotANumber)?;
    }
    Ok(values)
}
