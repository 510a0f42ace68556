//! OpenAPI document assembled from per-router YAML fragments.
//!
//! Each file under `docs/` holds a partial OpenAPI document with `paths` and
//! optionally `components.schemas`. They are embedded at compile time and merged
//! once at startup; a duplicate path or schema name is an error.

use serde_json::{json, Map, Value};
use thiserror::Error;

pub const FRAGMENTS: &[(&str, &str)] = &[
    ("pets.yaml", include_str!("../docs/pets.yaml")),
    ("users.yaml", include_str!("../docs/users.yaml")),
    ("sessions.yaml", include_str!("../docs/sessions.yaml")),
    ("adoptions.yaml", include_str!("../docs/adoptions.yaml")),
    ("mocks.yaml", include_str!("../docs/mocks.yaml")),
];

#[derive(Debug, Error)]
pub enum DocsError {
    #[error("invalid yaml in {fragment}: {source}")]
    Yaml {
        fragment: String,
        source: serde_yaml::Error,
    },
    #[error("{fragment}: `{section}` must be a mapping")]
    NotAMapping {
        fragment: String,
        section: &'static str,
    },
    #[error("{fragment}: {kind} `{key}` is already defined")]
    Duplicate {
        fragment: String,
        kind: &'static str,
        key: String,
    },
}

pub fn build_openapi() -> Result<Value, DocsError> {
    build_from(FRAGMENTS)
}

pub fn build_from(fragments: &[(&str, &str)]) -> Result<Value, DocsError> {
    let mut paths = Map::new();
    let mut schemas = Map::new();

    for (name, raw) in fragments {
        let fragment: Value = serde_yaml::from_str(raw).map_err(|source| DocsError::Yaml {
            fragment: name.to_string(),
            source,
        })?;
        merge_section(name, "path", fragment.get("paths"), &mut paths)?;
        merge_section(
            name,
            "schema",
            fragment.pointer("/components/schemas"),
            &mut schemas,
        )?;
    }

    Ok(json!({
        "openapi": "3.0.1",
        "info": {
            "title": "Adoptme API",
            "description": "REST API for finding families for street pets",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "paths": paths,
        "components": { "schemas": schemas },
    }))
}

fn merge_section(
    fragment: &str,
    kind: &'static str,
    section: Option<&Value>,
    into: &mut Map<String, Value>,
) -> Result<(), DocsError> {
    let Some(section) = section else {
        return Ok(());
    };
    let entries = section.as_object().ok_or_else(|| DocsError::NotAMapping {
        fragment: fragment.to_string(),
        section: kind,
    })?;
    for (key, value) in entries {
        if into.contains_key(key) {
            return Err(DocsError::Duplicate {
                fragment: fragment.to_string(),
                kind,
                key: key.clone(),
            });
        }
        into.insert(key.clone(), value.clone());
    }
    Ok(())
}

/// Swagger UI page pointing at the served document.
pub fn swagger_ui_html(spec_url: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Adoptme API</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js" crossorigin></script>
  <script>
    window.onload = () => {{
      window.ui = SwaggerUIBundle({{ url: "{spec_url}", dom_id: "#swagger-ui" }});
    }};
  </script>
</body>
</html>
"##
    )
}
