use anyhow::Context;
use dlopen2::wrapper::{Container, WrapperApi};
use std::{
    env::consts::{DLL_EXTENSION, DLL_PREFIX},
    path::{Path, PathBuf},
};

/// Symbols a reduce application exports.
#[derive(WrapperApi)]
pub struct Api {
    reduce: fn(key: &str, values: Vec<String>) -> Result<String, String>,
}

/// A reduce application loaded from `{lib_dir}/lib{app_name}.so` (or the
/// platform equivalent).
pub struct App {
    pub app_name: String,
    cont: Container<Api>,
}

impl App {
    pub fn load(lib_dir: impl AsRef<Path>, app_name: &str) -> anyhow::Result<Self> {
        let lib_path = lib_path(lib_dir.as_ref(), app_name);
        let cont: Container<Api> = unsafe { Container::load(&lib_path) }
            .with_context(|| format!("load reduce app from {}", lib_path.display()))?;
        Ok(Self {
            app_name: app_name.to_string(),
            cont,
        })
    }

    pub fn call_reduce(&self, key: &str, values: Vec<String>) -> Result<String, String> {
        self.cont.reduce(key, values)
    }
}

fn lib_path(lib_dir: &Path, app_name: &str) -> PathBuf {
    lib_dir.join(format!("{DLL_PREFIX}{app_name}.{DLL_EXTENSION}"))
}
