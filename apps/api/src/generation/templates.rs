//! Built-in LaTeX templates, compiled into the binary.
//! Placeholders use the `[[KEY]]` form and are filled by the generative service.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Template {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing)]
    pub latex: &'static str,
}

pub const DEFAULT_TEMPLATE: &str = "classic";

pub const TEMPLATES: &[Template] = &[
    Template {
        name: "classic",
        description: "Single column, serif, ruled section headings",
        latex: include_str!("../../templates/classic.tex"),
    },
    Template {
        name: "modern",
        description: "Accent colour, compact entries and a projects section",
        latex: include_str!("../../templates/modern.tex"),
    },
];

pub fn find_template(name: &str) -> Option<&'static Template> {
    let name = name.trim();
    TEMPLATES.iter().find(|t| t.name.eq_ignore_ascii_case(name))
}
