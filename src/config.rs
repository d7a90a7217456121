use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::{env, fs, io};

use lazy_static::lazy_static;
use serde::Deserialize;

use crate::dates::MonthTable;

#[derive(Deserialize)]
pub struct Site {
    /// Origin used for every generated absolute URL, no trailing slash.
    pub base_url: String,
    pub title: String,
    pub description: String,
    pub default_lang: String,
    #[serde(default = "default_uploads_path")]
    pub uploads_path: String,
    /// Fallback Open Graph image for listing pages.
    pub og_image: Option<String>,
}

#[derive(Deserialize)]
pub struct Blog {
    pub perpage: u32,
    pub subjects_perpage: u32,
    pub latest_posts_count: usize,
    pub popular_tags_count: usize,
    /// Chrono pattern used for the date line on detail pages.
    pub date_pattern: String,
    pub subjects_title: String,
    pub subjects_desc: String,
    /// When set, search obeys the same time gating and ordering as
    /// every other listing instead of the historical behavior.
    #[serde(default)]
    pub strict_search_visibility: bool,
}

#[derive(Deserialize)]
pub struct Paths {
    pub template_dir: PathBuf,
    pub public_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub data_file: PathBuf,
}

#[derive(Deserialize)]
pub struct Server {
    pub address: String,
    pub port: u16,
    /// Requests carrying this token in `X-Preview-Token` count as
    /// authenticated and may open unpublished posts by slug.
    pub preview_token: Option<String>,
}

#[derive(Deserialize)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize)]
pub struct Config {
    pub site: Site,
    pub blog: Blog,
    pub paths: Paths,
    pub server: Server,
    pub log: Option<Log>,
    /// Month-abbreviation translations per locale:
    /// `[months.pl] nov = "lis"` and so on.
    #[serde(default)]
    pub months: HashMap<String, MonthTable>,
}

impl Config {
    pub fn months_for(&self, lang: &str) -> &MonthTable {
        lazy_static! {
            static ref EMPTY: MonthTable = MonthTable::new();
        }
        self.months.get(lang).unwrap_or(&EMPTY)
    }
}

fn default_uploads_path() -> String {
    "/uploads".to_string()
}

fn parse_path(path: PathBuf) -> PathBuf {
    if path.starts_with("${exe_dir}") {
        let cur_exe = env::current_exe().unwrap();
        let exe_dir = cur_exe.parent().unwrap().to_str().unwrap();
        let str_path = path.to_str().unwrap();
        PathBuf::from(str_path.replace("${exe_dir}", exe_dir))
    } else {
        path
    }
}

pub fn read_config(cfg_path: &PathBuf) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.to_str().unwrap(), e))),
    };

    let mut cfg: Config = match toml::from_str::<Config>(cfg_content.as_str()) {
        Ok(cfg) => cfg,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    };

    cfg.paths = Paths {
        template_dir: parse_path(cfg.paths.template_dir),
        public_dir: parse_path(cfg.paths.public_dir),
        uploads_dir: parse_path(cfg.paths.uploads_dir),
        data_file: parse_path(cfg.paths.data_file),
    };

    Ok(cfg)
}
