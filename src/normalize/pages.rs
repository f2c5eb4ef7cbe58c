//! Page url resolution from the at-home delivery server answer.

use crate::requests::chapter::ChapterDownloadMeta;

use serde::{Deserialize, Serialize};

/// Image variant served by the delivery server
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PageQuality {
    /// Original quality, `data` file list
    #[default]
    Data,
    /// Compressed variant, `dataSaver` file list
    DataSaver,
}

impl PageQuality {
    fn path_segment(self) -> &'static str {
        match self {
            PageQuality::Data => "data",
            PageQuality::DataSaver => "data-saver",
        }
    }
}

/// Builds `{baseUrl}/{data|data-saver}/{hash}/{filename}` for every file, in reading order.
/// Filenames are neither reordered nor deduplicated
pub fn resolve(meta: &ChapterDownloadMeta, quality: PageQuality) -> Vec<String> {
    let files = match quality {
        PageQuality::Data => &meta.chapter.data,
        PageQuality::DataSaver => &meta.chapter.data_saver,
    };

    let base_url = meta.base_url.trim_end_matches('/');
    let segment = quality.path_segment();
    let hash = &meta.chapter.hash;

    files
        .iter()
        .map(|file| format!("{base_url}/{segment}/{hash}/{file}"))
        .collect()
}
