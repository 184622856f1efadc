//! Expansion of `${VAR}` references and `~` in `quire.toml` values.
//!
//! Remote docs usually need a token in `fetch.request_headers` and a
//! deployment-specific `docs.base_path`; both come from the environment.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` in `value`.
///
/// Bare `$VAR` is left alone so header values such as `Bearer $token` pass
/// through untouched. `field` names the setting in the error.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }
    shellexpand::env_with_context(value, lookup)
        .map(Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        })
}

/// Expand every request header value in place. Header names are literal.
pub(crate) fn expand_headers(headers: &mut BTreeMap<String, String>) -> Result<(), ConfigError> {
    for (name, value) in headers.iter_mut() {
        *value = expand_env(value, &format!("fetch.request_headers.{name}"))?;
    }
    Ok(())
}

/// Expand a directory setting: environment references first, then a
/// leading `~`.
pub(crate) fn expand_dir(value: &str, field: &str) -> Result<String, ConfigError> {
    let value = expand_env(value, field)?;
    Ok(shellexpand::tilde(&value).into_owned())
}

fn lookup(var: &str) -> Result<Option<String>, std::env::VarError> {
    std::env::var(var).map(Some)
}
