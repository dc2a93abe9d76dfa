use crate::{FolderId, MemoryCatalog, NewItem, TagId, ViewerId};
use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Instant};
use tracing::info;

/// JSON description of a whole catalog.
///
/// Items name their tags by slash separated path from a root tag, e.g.
/// `"IFDY/Test Tag 1/Sub Test Tag 3"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub tags: Vec<TagSnapshot>,
    #[serde(default)]
    pub libraries: Vec<LibrarySnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagSnapshot {
    pub name: String,
    #[serde(default)]
    pub children: Vec<TagSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    pub display_name: String,
    pub machine_name: String,
    #[serde(default)]
    pub absolute_path: PathBuf,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub owner: Option<ViewerId>,
    #[serde(default)]
    pub folders: Vec<FolderSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderSnapshot {
    pub name: String,
    #[serde(default)]
    pub folders: Vec<FolderSnapshot>,
    #[serde(default)]
    pub items: Vec<ItemSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl MemoryCatalog {
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Result<Self> {
        let load_time = Instant::now();
        let mut catalog = MemoryCatalog::new();
        let mut pending = snapshot
            .tags
            .into_iter()
            .map(|tag| (None, tag))
            .collect::<Vec<(Option<TagId>, TagSnapshot)>>();
        while let Some((parent, tag)) = pending.pop() {
            let id = catalog
                .add_tag(tag.name, parent)
                .context("Failed to add tag")?;
            pending.extend(tag.children.into_iter().map(|child| (Some(id), child)));
        }
        for library in snapshot.libraries {
            if catalog
                .library_by_machine_name(&library.machine_name)
                .is_some()
            {
                bail!("duplicate library machine name {:?}", library.machine_name);
            }
            let id = catalog.add_library(
                library.display_name,
                library.machine_name,
                library.absolute_path,
                library.nsfw,
                library.owner,
            );
            let mut folders = Vec::new();
            for folder in library.folders {
                let folder_id = catalog.add_folder(id, folder.name.clone())?;
                folders.push((folder_id, folder));
            }
            while let Some((folder_id, folder)) = folders.pop() {
                catalog.add_snapshot_items(folder_id, folder.items)?;
                for child in folder.folders {
                    let child_id = catalog.add_subfolder(folder_id, child.name.clone())?;
                    folders.push((child_id, child));
                }
            }
        }
        info!(
            "Catalog load time: {:?}, {} items",
            load_time.elapsed(),
            catalog.item_count()
        );
        Ok(catalog)
    }

    fn add_snapshot_items(&mut self, folder: FolderId, items: Vec<ItemSnapshot>) -> Result<()> {
        for item in items {
            let tags = item
                .tags
                .iter()
                .map(|path| {
                    self.tag_from_path(path)
                        .ok_or_else(|| anyhow!("unknown tag path {path:?} on {:?}", item.name))
                })
                .collect::<Result<Vec<_>>>()?;
            self.add_item(
                folder,
                NewItem {
                    name: item.name,
                    width: item.width,
                    height: item.height,
                    rating: item.rating,
                    nsfw: item.nsfw,
                    comment: item.comment,
                    size: item.size,
                    tags,
                },
            )?;
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let snapshot: CatalogSnapshot =
            serde_json::from_str(json).context("Failed to parse catalog snapshot")?;
        Self::from_snapshot(snapshot)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog snapshot {}", path.display()))?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tag_paths_fail() {
        let json = r#"{
            "tags": [{ "name": "IFDY" }],
            "libraries": [{
                "display_name": "Testing Library",
                "machine_name": "testing",
                "folders": [{
                    "name": "Foo Files 1",
                    "items": [{ "name": "a.png", "width": 1, "height": 1, "tags": ["IFDY/Nope"] }]
                }]
            }]
        }"#;
        let err = MemoryCatalog::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("IFDY/Nope"), "{err}");
    }

    #[test]
    fn malformed_json_fails() {
        let err = MemoryCatalog::from_json_str("{ \"libraries\": 3 }").unwrap_err();
        assert!(err.to_string().contains("Failed to parse catalog snapshot"));
    }

    #[test]
    fn nested_folders_and_tags() {
        let json = r#"{
            "tags": [{ "name": "IFDY", "children": [{ "name": "Test Tag 1" }] }],
            "libraries": [{
                "display_name": "Testing Library",
                "machine_name": "testing",
                "folders": [{
                    "name": "Foo Files 1",
                    "folders": [{
                        "name": "Deeper",
                        "items": [{ "name": "b.png", "width": 2, "height": 2, "tags": ["IFDY/Test Tag 1"] }]
                    }]
                }]
            }]
        }"#;
        let catalog = MemoryCatalog::from_json_str(json).unwrap();
        assert_eq!(catalog.item_count(), 1);
        let (index, item) = catalog.items.iter().next().unwrap();
        assert_eq!(
            catalog.item_path(crate::ItemId::from_index(index)).unwrap(),
            "testing/Foo Files 1/Deeper/b.png"
        );
        assert_eq!(catalog.tag_names(item).collect::<Vec<_>>(), vec!["Test Tag 1"]);
    }

    #[test]
    fn duplicate_machine_names_fail() {
        let json = r#"{
            "libraries": [
                { "display_name": "Testing Library", "machine_name": "testing" },
                { "display_name": "Other Library", "machine_name": "testing" }
            ]
        }"#;
        let err = MemoryCatalog::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("duplicate library machine name"), "{err}");

        let catalog = MemoryCatalog::from_json_str(
            r#"{ "libraries": [{ "display_name": "Testing Library", "machine_name": "testing" }] }"#,
        )
        .unwrap();
        assert!(catalog.library_by_machine_name("testing").is_some());
        assert!(catalog.library_by_machine_name("other").is_none());
    }
}
