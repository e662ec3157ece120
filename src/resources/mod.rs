//! Loading of text assets such as shader sources.
//!
//! Natively files are read from `./assets`; on the web they are fetched
//! relative to `<origin>/assets/`.

use anyhow::Context as _;

use crate::data_structures::material::{Material, MaterialConfig};

/// A vertex and fragment shader pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSource {
    /// Material configuration using these sources and default state.
    pub fn material_config(&self) -> MaterialConfig {
        MaterialConfig {
            vertex_shader: self.vertex.clone(),
            fragment_shader: self.fragment.clone(),
            ..Default::default()
        }
    }

    pub fn material(&self) -> Material {
        Material::new(self.material_config())
    }
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("no global window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("cannot read the page origin: {e:?}"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

pub async fn load_string(file_name: &str) -> anyhow::Result<String> {
    #[cfg(target_arch = "wasm32")]
    let txt = {
        let url = format_url(file_name)?;
        reqwest::get(url)
            .await?
            .error_for_status()?
            .text()
            .await?
    };
    #[cfg(not(target_arch = "wasm32"))]
    let txt = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        std::fs::read_to_string(&path)
            .with_context(|| format!("could not read {}", path.display()))?
    };

    Ok(txt)
}

/// Load both shader stages concurrently.
pub async fn load_shader_source(vertex: &str, fragment: &str) -> anyhow::Result<ShaderSource> {
    let (vertex, fragment) = futures::try_join!(load_string(vertex), load_string(fragment))?;
    Ok(ShaderSource { vertex, fragment })
}
