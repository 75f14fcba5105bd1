//! The HTML shell served on the first GET of a page.

use std::sync::Arc;

use super::{Component, Page};
use crate::config::Settings;
use crate::element::{body, head, html, link, meta, script, title, Element, ElementBuilder};
use crate::error::Result;
use crate::live::session::Session;
use crate::render::render;

/// Head and body options of the shell.
#[derive(Debug, Clone)]
pub struct Document {
    pub title: String,
    pub lang: String,
    pub theme: String,
    pub dev: bool,
    pub favicon: Option<String>,
    pub stylesheet: String,
    pub runtime_script: String,
    pub events_path: String,
    /// Extra elements appended to `<head>`, e.g. scripts of third-party widgets.
    pub extra_assets: Vec<Element>,
}

impl Default for Document {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl Document {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            title: settings.title.clone(),
            lang: settings.lang.clone(),
            theme: settings.theme.clone(),
            dev: settings.is_dev(),
            favicon: settings.favicon.clone(),
            stylesheet: settings.stylesheet.clone(),
            runtime_script: settings.runtime_script.clone(),
            events_path: settings.events_path.clone(),
            extra_assets: Vec::new(),
        }
    }

    pub fn with_asset(mut self, asset: Element) -> Self {
        self.extra_assets.push(asset);
        self
    }

    /// Render the full document around `page`.
    pub fn render(&self, page: &Page, session: Option<Arc<Session>>) -> Result<String> {
        let markup = render(session, || {
            html()
                .attr("lang", &self.lang)
                .attr("data_theme", &self.theme)
                .children(|| {
                    head().children(|| self.head())?;
                    body()
                        .attr("hx_ext", "morph")
                        .attr("data_schorle_events", &self.events_path)
                        .children(|| page.add())
                })
        })?;
        Ok(format!("<!DOCTYPE html>{}", markup))
    }

    fn head(&self) -> Result<()> {
        meta().attr("charset", "utf-8").add()?;
        meta()
            .attr("name", "viewport")
            .attr("content", "width=device-width, initial-scale=1.0")
            .add()?;
        if self.dev {
            meta()
                .attr("name", "schorle-dev")
                .attr("content", "true")
                .add()?;
        }
        meta()
            .attr("name", "title")
            .attr("content", &self.title)
            .add()?;
        if let Some(favicon) = &self.favicon {
            link()
                .attr("href", favicon)
                .attr("rel", "icon")
                .attr("type", "image/svg+xml")
                .add()?;
        }
        link()
            .attr("href", &self.stylesheet)
            .attr("rel", "stylesheet")
            .attr("type", "text/css")
            .add()?;
        script()
            .attr("src", &self.runtime_script)
            .attr("crossorigin", "anonymous")
            .attr("defer", "")
            .add()?;
        for asset in &self.extra_assets {
            ElementBuilder::from(asset.clone()).add()?;
        }
        title().text(&self.title)
    }
}
