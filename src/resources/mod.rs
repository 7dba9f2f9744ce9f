/**
 * This module contains all logic for loading meshes and materials from external files.
 *
 * Relative locations resolve against the asset root: `./assets` natively and
 * `<origin>/assets` in the browser. Absolute `http(s)` URLs are fetched as is.
 */
pub mod mtl;
pub mod obj;

use crate::{
    data_structures::{material::MaterialLibrary, mesh::MeshData},
    error::{Error, Result},
};

/// Where asset text comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetSource {
    /// Text already in memory.
    Inline(String),
    /// A path or URL, see [`load_string`].
    Location(String),
}

impl AssetSource {
    pub fn location(location: impl Into<String>) -> Self {
        Self::Location(location.into())
    }

    async fn read(&self) -> Result<String> {
        match self {
            Self::Inline(text) => Ok(text.clone()),
            Self::Location(location) => load_string(location).await,
        }
    }
}

fn absolute_url(location: &str) -> Option<reqwest::Url> {
    reqwest::Url::parse(location)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> Result<reqwest::Url> {
    let origin = web_sys::window()
        .and_then(|window| window.location().origin().ok())
        .ok_or_else(|| Error::fetch(file_name, "no browser window to resolve against"))?;
    reqwest::Url::parse(&format!("{origin}/assets/"))
        .and_then(|base| base.join(file_name))
        .map_err(|e| Error::fetch(file_name, e))
}

async fn fetch_text(url: reqwest::Url) -> Result<String> {
    let location = url.to_string();
    let response = reqwest::get(url)
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| Error::fetch(&location, e))?;
    response.text().await.map_err(|e| Error::fetch(&location, e))
}

pub async fn load_string(file_name: &str) -> Result<String> {
    if let Some(url) = absolute_url(file_name) {
        return fetch_text(url).await;
    }
    #[cfg(target_arch = "wasm32")]
    let txt = fetch_text(format_url(file_name)?).await?;
    #[cfg(not(target_arch = "wasm32"))]
    let txt = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::fetch(path.display().to_string(), e))?
    };

    Ok(txt)
}

/// Loads and parses one OBJ mesh, centered on its centroid.
pub async fn load_mesh(source: &AssetSource, name: &str) -> Result<MeshData> {
    let text = source.read().await?;
    obj::parse_obj(&text, name)
}

/// Loads and parses one MTL file.
pub async fn load_materials(source: &AssetSource) -> Result<MaterialLibrary> {
    let text = source.read().await?;
    let name = match source {
        AssetSource::Inline(_) => "inline material library",
        AssetSource::Location(location) => location.as_str(),
    };
    mtl::parse_mtl(&text, name)
}
