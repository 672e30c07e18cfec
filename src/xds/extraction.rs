//! Parameter templates to regex extraction rules.
//!
//! A parameter template such as `/users/{id}/accounts/{ account }` names the
//! parts of a header (or the path) that a transformation wants to reuse.
//! [`compile_template`] turns it into one regex whose N-th capture group
//! yields the N-th placeholder; [`build_extractors`] does that for every
//! template of a [`Parameters`] set and produces one [`Extraction`] per name.
//! [`build_response_extractors`] is the same for response headers.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::domain::{Parameters, ResponseParameters};
use crate::errors::{Result, TranslatorError};
use crate::xds::filters::transformation::Extraction;

/// `{` + optional whitespace + name + optional whitespace + `}`
static PLACEHOLDER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\s*([\.\-_[:word:]]+)\s*\}").expect("placeholder regex is valid")
});

/// Capture group substituted for every placeholder. `%` is allowed so
/// percent-encoded path segments still match.
pub const PLACEHOLDER_CAPTURE: &str = r"([\-._%[:alnum:]]+)";

/// Regex used for the whole-value `method` and `path` extractions
pub const WHOLE_VALUE_REGEX: &str = "(.*)";

/// Pseudo-header carrying the request path
pub const PATH_HEADER: &str = ":path";

/// Pseudo-header carrying the request method
pub const METHOD_HEADER: &str = ":method";

/// Result of compiling one template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTemplate {
    /// Placeholder names, left to right
    pub names: Vec<String>,
    /// Regex whose group `i + 1` captures `names[i]`
    pub pattern: String,
}

/// Compile a parameter template into placeholder names and an extraction regex.
///
/// Everything outside placeholders is escaped and matched literally.
pub fn compile_template(template: &str) -> CompiledTemplate {
    let mut names = Vec::new();
    let mut pattern = String::with_capacity(template.len() + 16);
    let mut literal_start = 0;

    for captures in PLACEHOLDER_REGEX.captures_iter(template) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        pattern.push_str(&regex::escape(&template[literal_start..whole.start()]));
        pattern.push_str(PLACEHOLDER_CAPTURE);
        names.push(name.as_str().to_string());
        literal_start = whole.end();
    }
    pattern.push_str(&regex::escape(&template[literal_start..]));

    CompiledTemplate { names, pattern }
}

/// Build the extraction rules for a parameter set.
///
/// `method` and `path` are always available as whole-value extractions.
/// The path template is processed next, then header templates in
/// alphabetical header order; when two templates use the same name the
/// later one wins.
pub fn build_extractors(params: &Parameters) -> Result<BTreeMap<String, Extraction>> {
    let mut extractors = BTreeMap::new();

    for header in [METHOD_HEADER, PATH_HEADER] {
        extractors.insert(
            header.trim_start_matches(':').to_string(),
            Extraction {
                header: header.to_string(),
                regex: WHOLE_VALUE_REGEX.to_string(),
                subgroup: 1,
            },
        );
    }

    if let Some(path) = &params.path {
        add_extractors_for_template(PATH_HEADER, path, &mut extractors)?;
    }

    for (header, template) in &params.headers {
        add_extractors_for_template(header, template, &mut extractors)?;
    }

    Ok(extractors)
}

/// Build the extraction rules for response headers.
///
/// Only the header templates contribute; there is no implicit `method` or
/// `path` rule on a response.
pub fn build_response_extractors(params: &ResponseParameters) -> Result<BTreeMap<String, Extraction>> {
    let mut extractors = BTreeMap::new();
    for (header, template) in &params.headers {
        add_extractors_for_template(header, template, &mut extractors)?;
    }
    Ok(extractors)
}

fn add_extractors_for_template(
    header: &str,
    template: &str,
    extractors: &mut BTreeMap<String, Extraction>,
) -> Result<()> {
    if template.is_empty() {
        return Ok(());
    }

    let compiled = compile_template(template);
    tracing::debug!(
        header = %header,
        parameters = ?compiled.names,
        regex = %compiled.pattern,
        "compiled extraction template"
    );

    // every `{` must have produced a placeholder, otherwise a brace was left
    // open or a name broke the grammar
    if template.matches('{').count() != compiled.names.len() {
        return Err(TranslatorError::malformed_template(template));
    }

    for (index, name) in compiled.names.into_iter().enumerate() {
        extractors.insert(
            name,
            Extraction {
                header: header.to_string(),
                regex: compiled.pattern.clone(),
                subgroup: index as u32 + 1,
            },
        );
    }

    Ok(())
}
