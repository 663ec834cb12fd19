use std::fmt::Write as _;

use super::handlers::InputForm;

/// View model of the index page.
#[derive(Debug, Clone, Default)]
pub struct IndexPage {
    pub input: InputForm,
    pub predicted_area: Option<String>,
}

impl IndexPage {
    pub fn render(&self) -> String {
        let mut html = String::with_capacity(1024);
        html.push_str(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n\
             <meta charset=\"utf-8\" />\n\
             <title>GitHub Issue Classifier</title>\n\
             </head>\n<body>\n<h1>GitHub Issue Classifier</h1>\n\
             <form method=\"post\" action=\"/\">\n",
        );
        let _ = write!(
            html,
            "<div>\n<label for=\"Input_Title\">Title</label>\n\
             <input id=\"Input_Title\" name=\"Input.Title\" type=\"text\" value=\"{}\" />\n</div>\n",
            escape_html(&self.input.title)
        );
        let _ = write!(
            html,
            "<div>\n<label for=\"Input_Description\">Description</label>\n\
             <textarea id=\"Input_Description\" name=\"Input.Description\" rows=\"8\">{}</textarea>\n</div>\n",
            escape_html(&self.input.description)
        );
        html.push_str("<button type=\"submit\">Predict area</button>\n</form>\n");

        if let Some(area) = &self.predicted_area {
            let _ = write!(
                html,
                "<p id=\"prediction\">Predicted area: <strong>{}</strong></p>\n",
                escape_html(area)
            );
        }

        html.push_str("</body>\n</html>\n");
        html
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
