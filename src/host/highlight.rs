//! playbook 高亮渲染：syntect 按 YAML 语法着色，输出内联样式的 HTML
//!
//! 深色模式用 `base16-ocean.dark`，浅色模式用 `InspiredGitHub`。

use std::sync::OnceLock;

use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::core::WizardError;
use crate::host::Highlighter;

const DARK_THEME: &str = "base16-ocean.dark";
const LIGHT_THEME: &str = "InspiredGitHub";

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme_set() -> &'static ThemeSet {
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

#[derive(Debug, Default)]
pub struct SyntectHighlighter;

impl Highlighter for SyntectHighlighter {
    fn render(&self, code: &str, dark_mode: bool) -> Result<String, WizardError> {
        let syntaxes = syntax_set();
        let syntax = syntaxes
            .find_syntax_by_extension("yaml")
            .unwrap_or_else(|| syntaxes.find_syntax_plain_text());

        let theme_name = if dark_mode { DARK_THEME } else { LIGHT_THEME };
        let theme = theme_set()
            .themes
            .get(theme_name)
            .ok_or_else(|| WizardError::Render(format!("theme {theme_name} not available")))?;

        highlighted_html_for_string(code, syntaxes, syntax, theme)
            .map_err(|e| WizardError::Render(e.to_string()))
    }
}
