//! Response types shared by the CLI and the HTTP server.
//!
//! Query handlers produce a [`Reply`]: a list of titled text sections (the
//! shape the chat frontend forwards as a message bundle) plus an optional
//! HTML page for views the frontend renders to an image.

use serde::Serialize;

/// One titled block of text inside a reply.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub title: String,
    pub body: String,
}

impl Section {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Section {
        Section {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// A complete query answer.
#[derive(Debug, Clone, Serialize, Default)]
pub struct Reply {
    pub sections: Vec<Section>,
    /// HTML page for timeline / potential / help views, when the query
    /// produces one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl Reply {
    pub fn new() -> Reply {
        Reply::default()
    }

    pub fn section(mut self, title: impl Into<String>, body: impl Into<String>) -> Reply {
        self.sections.push(Section::new(title, body));
        self
    }

    pub fn with_html(mut self, html: String) -> Reply {
        self.html = Some(html);
        self
    }

    /// Print the reply the way the chat frontend would forward it.
    pub fn print(&self) {
        for section in &self.sections {
            println!("--- {} ---", section.title);
            println!("{}", section.body);
            println!();
        }
        if self.html.is_some() {
            println!("(html page attached)");
        }
    }
}
