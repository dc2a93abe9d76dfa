use crate::{Attribute, Catalog, MemoryQueryBuilder, ViewerId, aspect_class};
use anyhow::{Context, Result, anyhow, bail};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use slab::Slab;
use std::path::PathBuf;
use thin_vec::ThinVec;

macro_rules! slab_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(usize);

            impl $name {
                pub fn from_index(index: usize) -> Self {
                    Self(index)
                }

                pub fn get(self) -> usize {
                    self.0
                }
            }
        )*
    };
}

slab_id!(LibraryId, FolderId, ItemId, TagId);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library {
    pub display_name: String,
    pub machine_name: String,
    pub absolute_path: PathBuf,
    pub nsfw: bool,
    /// `None` makes the library visible to every viewer.
    pub owner: Option<ViewerId>,
    pub folders: ThinVec<FolderId>,
}

impl Library {
    pub fn visible_to(&self, viewer: ViewerId) -> bool {
        self.owner.is_none_or(|owner| owner == viewer)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    pub name: String,
    pub library: LibraryId,
    pub parent: Option<FolderId>,
    pub children: ThinVec<FolderId>,
    pub items: ThinVec<ItemId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub parent: Option<TagId>,
    pub children: ThinVec<TagId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub folder: FolderId,
    pub width: u32,
    pub height: u32,
    pub rating: u8,
    /// Flagged on the item itself; the library flag is applied on top.
    pub nsfw: bool,
    pub comment: Option<String>,
    pub size: u64,
    pub tags: ThinVec<TagId>,
}

/// Picture passed to [`MemoryCatalog::add_item`].
#[derive(Debug, Clone, Default)]
pub struct NewItem {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub rating: u8,
    pub nsfw: bool,
    pub comment: Option<String>,
    pub size: u64,
    pub tags: Vec<TagId>,
}

impl NewItem {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            ..Self::default()
        }
    }

    pub fn rating(mut self, rating: u8) -> Self {
        self.rating = rating;
        self
    }

    pub fn nsfw(mut self, nsfw: bool) -> Self {
        self.nsfw = nsfw;
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn tag(mut self, tag: TagId) -> Self {
        self.tags.push(tag);
        self
    }
}

/// Catalog held entirely in memory.
///
/// Nodes live in slabs and refer to each other by id. The catalog is only
/// mutated while it is being built, so a shared reference can serve any
/// number of concurrent queries.
#[derive(Default, Serialize, Deserialize)]
pub struct MemoryCatalog {
    pub(crate) libraries: Slab<Library>,
    pub(crate) folders: Slab<Folder>,
    pub(crate) items: Slab<Item>,
    pub(crate) tags: Slab<Tag>,
    /// Tag name to every tag carrying it, whatever its parent.
    #[serde(skip)]
    tag_index: HashMap<String, ThinVec<TagId>>,
}

impl std::fmt::Debug for MemoryCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCatalog")
            .field("libraries.len()", &self.libraries.len())
            .field("folders.len()", &self.folders.len())
            .field("items.len()", &self.items.len())
            .field("tags.len()", &self.tags.len())
            .finish()
    }
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_library(
        &mut self,
        display_name: impl Into<String>,
        machine_name: impl Into<String>,
        absolute_path: impl Into<PathBuf>,
        nsfw: bool,
        owner: Option<ViewerId>,
    ) -> LibraryId {
        LibraryId(self.libraries.insert(Library {
            display_name: display_name.into(),
            machine_name: machine_name.into(),
            absolute_path: absolute_path.into(),
            nsfw,
            owner,
            folders: ThinVec::new(),
        }))
    }

    /// Adds a folder at the top of `library`.
    pub fn add_folder(&mut self, library: LibraryId, name: impl Into<String>) -> Result<FolderId> {
        let entry = self
            .libraries
            .get_mut(library.0)
            .ok_or_else(|| anyhow!("no library {library:?}"))?;
        let id = FolderId(self.folders.insert(Folder {
            name: name.into(),
            library,
            parent: None,
            children: ThinVec::new(),
            items: ThinVec::new(),
        }));
        entry.folders.push(id);
        Ok(id)
    }

    pub fn add_subfolder(&mut self, parent: FolderId, name: impl Into<String>) -> Result<FolderId> {
        let library = self.folder(parent).context("no parent folder")?.library;
        let id = FolderId(self.folders.insert(Folder {
            name: name.into(),
            library,
            parent: Some(parent),
            children: ThinVec::new(),
            items: ThinVec::new(),
        }));
        if let Some(parent) = self.folders.get_mut(parent.0) {
            parent.children.push(id);
        }
        Ok(id)
    }

    pub fn add_tag(&mut self, name: impl Into<String>, parent: Option<TagId>) -> Result<TagId> {
        let name = name.into();
        if name.is_empty() || name.contains('/') {
            bail!("invalid tag name {name:?}");
        }
        if let Some(parent) = parent {
            if self.tag(parent).is_none() {
                bail!("no parent tag {parent:?}");
            }
            if self.child_tag(Some(parent), &name).is_some() {
                bail!("tag {name:?} already exists under {parent:?}");
            }
        } else if self.child_tag(None, &name).is_some() {
            bail!("root tag {name:?} already exists");
        }
        let id = TagId(self.tags.insert(Tag {
            name: name.clone(),
            parent,
            children: ThinVec::new(),
        }));
        if let Some(parent) = parent.and_then(|parent| self.tags.get_mut(parent.0)) {
            parent.children.push(id);
        }
        self.tag_index.entry(name).or_default().push(id);
        Ok(id)
    }

    pub fn add_item(&mut self, folder: FolderId, item: NewItem) -> Result<ItemId> {
        if self.folder(folder).is_none() {
            bail!("no folder {folder:?}");
        }
        if let Some(missing) = item.tags.iter().find(|tag| self.tag(**tag).is_none()) {
            bail!("no tag {missing:?}");
        }
        let mut tags = ThinVec::with_capacity(item.tags.len());
        for tag in item.tags {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        let id = ItemId(self.items.insert(Item {
            name: item.name,
            folder,
            width: item.width,
            height: item.height,
            rating: item.rating,
            nsfw: item.nsfw,
            comment: item.comment,
            size: item.size,
            tags,
        }));
        if let Some(folder) = self.folders.get_mut(folder.0) {
            folder.items.push(id);
        }
        Ok(id)
    }

    pub fn library(&self, id: LibraryId) -> Option<&Library> {
        self.libraries.get(id.0)
    }

    pub fn folder(&self, id: FolderId) -> Option<&Folder> {
        self.folders.get(id.0)
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id.0)
    }

    pub fn tag(&self, id: TagId) -> Option<&Tag> {
        self.tags.get(id.0)
    }

    pub fn library_by_machine_name(&self, machine_name: &str) -> Option<LibraryId> {
        self.libraries
            .iter()
            .find(|(_, library)| library.machine_name == machine_name)
            .map(|(index, _)| LibraryId(index))
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Every tag named `name`, under any parent.
    pub fn tags_named(&self, name: &str) -> &[TagId] {
        self.tag_index.get(name).map_or(&[], |ids| ids.as_slice())
    }

    fn child_tag(&self, parent: Option<TagId>, name: &str) -> Option<TagId> {
        self.tags_named(name)
            .iter()
            .copied()
            .find(|id| self.tag(*id).is_some_and(|tag| tag.parent == parent))
    }

    /// Resolves a slash separated tag path such as `IFDY/Test Tag 1/Sub Test Tag 3`.
    pub fn tag_from_path(&self, path: &str) -> Option<TagId> {
        let mut current = None;
        for segment in path.split('/') {
            current = Some(self.child_tag(current, segment)?);
        }
        current
    }

    pub fn tag_path(&self, id: TagId) -> Option<String> {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            let tag = self.tag(id)?;
            segments.push(tag.name.as_str());
            current = tag.parent;
        }
        segments.reverse();
        Some(segments.join("/"))
    }

    pub fn library_of(&self, item: &Item) -> Option<&Library> {
        self.folder(item.folder)
            .and_then(|folder| self.library(folder.library))
    }

    /// `library/folder/.../name`, using the library's machine name.
    pub fn item_path(&self, id: ItemId) -> Option<String> {
        let item = self.item(id)?;
        let mut segments = vec![item.name.as_str()];
        let mut folder = Some(item.folder);
        let mut library = None;
        while let Some(id) = folder {
            let entry = self.folder(id)?;
            segments.push(entry.name.as_str());
            library = Some(entry.library);
            folder = entry.parent;
        }
        segments.push(self.library(library?)?.machine_name.as_str());
        segments.reverse();
        Some(segments.join("/"))
    }

    pub fn visible_to(&self, item: &Item, viewer: ViewerId) -> bool {
        self.library_of(item)
            .is_some_and(|library| library.visible_to(viewer))
    }

    /// Effective nsfw flag: set on the item or on its library.
    pub fn is_nsfw(&self, item: &Item) -> bool {
        item.nsfw || self.library_of(item).is_some_and(|library| library.nsfw)
    }

    pub fn tag_names<'a>(&'a self, item: &'a Item) -> impl Iterator<Item = &'a str> + 'a {
        item.tags
            .iter()
            .filter_map(|id| self.tag(*id))
            .map(|tag| tag.name.as_str())
    }

    pub(crate) fn item_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.iter().map(|(index, _)| ItemId(index))
    }

    /// Rebuilds lookup tables that are not persisted.
    pub(crate) fn reindex(&mut self) {
        self.tag_index.clear();
        for (index, tag) in &self.tags {
            self.tag_index
                .entry(tag.name.clone())
                .or_default()
                .push(TagId(index));
        }
    }
}

/// Integer value of `attribute` for `item`, if it is an integer attribute.
pub(crate) fn integer_value(catalog: &MemoryCatalog, item: &Item, attribute: Attribute) -> Option<i64> {
    Some(match attribute {
        Attribute::Width => i64::from(item.width),
        Attribute::Height => i64::from(item.height),
        Attribute::Aspect => aspect_class(item.width, item.height),
        Attribute::Rating => i64::from(item.rating),
        Attribute::Nsfw => i64::from(catalog.is_nsfw(item)),
        Attribute::Size => i64::try_from(item.size).unwrap_or(i64::MAX),
        Attribute::Name | Attribute::Comment | Attribute::Filetype | Attribute::Tags => return None,
    })
}

/// Text value of `attribute`; `None` when the item has no value for it.
pub(crate) fn text_value(item: &Item, attribute: Attribute) -> Option<String> {
    match attribute {
        Attribute::Name => Some(item.name.clone()),
        Attribute::Comment => item.comment.clone(),
        Attribute::Filetype => Some(filetype(&item.name)),
        _ => None,
    }
}

/// Lower-case extension of `name`, empty when there is none.
pub fn filetype(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => extension.to_ascii_lowercase(),
        _ => String::new(),
    }
}

impl Catalog for MemoryCatalog {
    type Builder<'a> = MemoryQueryBuilder<'a>;

    fn attributes(&self) -> &[Attribute] {
        &Attribute::ALL
    }

    fn scoped_query(&self, viewer: ViewerId) -> Self::Builder<'_> {
        MemoryQueryBuilder::new(self, viewer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged() -> (MemoryCatalog, TagId, TagId) {
        let mut catalog = MemoryCatalog::new();
        let root = catalog.add_tag("IFDY", None).unwrap();
        let first = catalog.add_tag("Test Tag 1", Some(root)).unwrap();
        catalog.add_tag("Sub Test Tag 3", Some(first)).unwrap();
        let second = catalog.add_tag("Test Tag 2", Some(root)).unwrap();
        let nested = catalog.add_tag("Test Tag 1", Some(second)).unwrap();
        (catalog, first, nested)
    }

    #[test]
    fn same_tag_name_under_different_parents() {
        let (catalog, first, nested) = tagged();
        assert_ne!(first, nested);
        assert_eq!(catalog.tag_from_path("IFDY/Test Tag 1"), Some(first));
        assert_eq!(catalog.tag_from_path("IFDY/Test Tag 2/Test Tag 1"), Some(nested));
        assert_eq!(catalog.tags_named("Test Tag 1").len(), 2);
        assert_eq!(catalog.tag_from_path("IFDY/Test Tag 3"), None);
        assert_eq!(catalog.tag_from_path("Test Tag 1"), None);
    }

    #[test]
    fn tag_paths_render_from_root() {
        let (catalog, _, nested) = tagged();
        assert_eq!(catalog.tag_path(nested).unwrap(), "IFDY/Test Tag 2/Test Tag 1");
        let sub = catalog.tag_from_path("IFDY/Test Tag 1/Sub Test Tag 3").unwrap();
        assert_eq!(catalog.tag_path(sub).unwrap(), "IFDY/Test Tag 1/Sub Test Tag 3");
    }

    #[test]
    fn duplicate_sibling_tags_are_rejected() {
        let (mut catalog, first, _) = tagged();
        let root = catalog.tag(first).unwrap().parent;
        assert!(catalog.add_tag("Test Tag 1", root).is_err());
        assert!(catalog.add_tag("IFDY", None).is_err());
        assert!(catalog.add_tag("a/b", None).is_err());
    }

    #[test]
    fn item_paths_walk_up_folders() {
        let mut catalog = MemoryCatalog::new();
        let library = catalog.add_library("Testing Library", "testing", "/srv/testing", false, None);
        let folder = catalog.add_folder(library, "Foo Files 1").unwrap();
        let nested = catalog.add_subfolder(folder, "Deeper").unwrap();
        let item = catalog.add_item(nested, NewItem::new("random100x100.png", 100, 100)).unwrap();
        assert_eq!(
            catalog.item_path(item).unwrap(),
            "testing/Foo Files 1/Deeper/random100x100.png"
        );
    }

    #[test]
    fn nsfw_comes_from_item_or_library() {
        let mut catalog = MemoryCatalog::new();
        let safe = catalog.add_library("Testing Library", "testing", "/srv/testing", false, None);
        let unsafe_lib = catalog.add_library("NSFW Library", "nsfw", "/srv/nsfw", true, None);
        let safe_folder = catalog.add_folder(safe, "Foo Files 1").unwrap();
        let unsafe_folder = catalog.add_folder(unsafe_lib, "Foo Files 2").unwrap();
        let plain = catalog.add_item(safe_folder, NewItem::new("a.png", 1, 1)).unwrap();
        let flagged = catalog
            .add_item(safe_folder, NewItem::new("b.png", 1, 1).nsfw(true))
            .unwrap();
        let inherited = catalog.add_item(unsafe_folder, NewItem::new("c.png", 1, 1)).unwrap();
        let nsfw = |id| catalog.is_nsfw(catalog.item(id).unwrap());
        assert!(!nsfw(plain));
        assert!(nsfw(flagged));
        assert!(nsfw(inherited));
    }

    #[test]
    fn filetype_is_lowercase_extension() {
        assert_eq!(filetype("random100x100.PNG"), "png");
        assert_eq!(filetype("archive.tar.gz"), "gz");
        assert_eq!(filetype("README"), "");
        assert_eq!(filetype(".hidden"), "");
    }

    #[test]
    fn rejects_unknown_references() {
        let mut catalog = MemoryCatalog::new();
        assert!(catalog.add_folder(LibraryId(3), "x").is_err());
        assert!(catalog.add_item(FolderId(0), NewItem::new("x.png", 1, 1)).is_err());
        let library = catalog.add_library("L", "l", "/l", false, None);
        let folder = catalog.add_folder(library, "f").unwrap();
        assert!(
            catalog
                .add_item(folder, NewItem::new("x.png", 1, 1).tag(TagId(9)))
                .is_err()
        );
    }
}
