//! Tree integrity engine: ancestry checks, subtree enumeration, and sibling
//! lookups over the entity store.
//!
//! Every walk is an explicit loop with a visited set and a hop or size
//! limit, so a corrupted parent chain surfaces as an internal error instead
//! of an endless loop or a stack overflow.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, error};

use cloudio_core::config::LimitsConfig;
use cloudio_core::error::AppError;
use cloudio_core::result::AppResult;
use cloudio_core::types::{FolderId, ItemKind, ItemRef, OwnerId};
use cloudio_database::EntityStore;
use cloudio_entity::{Entry, File, Folder};

/// A folder together with everything below it.
#[derive(Debug, Clone, Default)]
pub struct Subtree {
    /// Descendant folders in breadth-first order (parents before children).
    /// The root itself is not included.
    pub folders: Vec<Folder>,
    /// Every file in the root and in each descendant folder.
    pub files: Vec<File>,
}

/// Read-side structural queries over one owner's tree.
#[derive(Debug, Clone)]
pub struct TreeIntegrity {
    store: Arc<dyn EntityStore>,
    limits: LimitsConfig,
}

impl TreeIntegrity {
    /// Creates a tree engine over `store`.
    pub fn new(store: Arc<dyn EntityStore>, limits: LimitsConfig) -> Self {
        Self { store, limits }
    }

    /// Fetch a folder owned by `owner`, or `NotFound`.
    pub async fn require_folder(&self, id: FolderId, owner: &OwnerId) -> AppResult<Folder> {
        self.store
            .get(ItemRef::Folder(id), owner)
            .await?
            .and_then(Entry::into_folder)
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))
    }

    /// Whether `candidate_ancestor` is `start` or lies on the parent chain
    /// above it.
    ///
    /// Both folders must exist and belong to `owner`.
    pub async fn is_descendant(
        &self,
        candidate_ancestor: FolderId,
        start: FolderId,
        owner: &OwnerId,
    ) -> AppResult<bool> {
        self.require_folder(candidate_ancestor, owner).await?;
        let start_folder = self.require_folder(start, owner).await?;

        if start == candidate_ancestor {
            return Ok(true);
        }

        let mut visited = HashSet::from([start]);
        let mut next = start_folder.parent_id;
        while let Some(current) = next {
            if current == candidate_ancestor {
                return Ok(true);
            }
            if !visited.insert(current) {
                return Err(self.cycle_detected(current));
            }
            if visited.len() > self.limits.max_tree_depth {
                return Err(self.too_deep(start));
            }
            next = self.parent_of(current, owner).await?;
        }
        Ok(false)
    }

    /// The chain of folders from the top level down to `folder`, inclusive.
    pub async fn ancestors(&self, folder: FolderId, owner: &OwnerId) -> AppResult<Vec<Folder>> {
        let leaf = self.require_folder(folder, owner).await?;
        let mut visited = HashSet::from([leaf.id]);
        let mut next = leaf.parent_id;
        let mut chain = vec![leaf];

        while let Some(current) = next {
            if !visited.insert(current) {
                return Err(self.cycle_detected(current));
            }
            if chain.len() >= self.limits.max_tree_depth {
                return Err(self.too_deep(folder));
            }
            let parent = self.require_parent(current, owner).await?;
            next = parent.parent_id;
            chain.push(parent);
        }

        chain.reverse();
        Ok(chain)
    }

    /// All folders below `folder`, breadth-first.
    pub async fn enumerate_descendant_folders(
        &self,
        folder: FolderId,
        owner: &OwnerId,
    ) -> AppResult<Vec<Folder>> {
        Ok(self.walk(folder, owner, false).await?.folders)
    }

    /// All folders and files below `folder`, including the files directly
    /// inside it.
    pub async fn enumerate_subtree(&self, folder: FolderId, owner: &OwnerId) -> AppResult<Subtree> {
        self.walk(folder, owner, true).await
    }

    /// Exact, case-sensitive lookup of a sibling named `name` under
    /// `parent`, skipping `exclude`.
    pub async fn find_sibling_by_name(
        &self,
        name: &str,
        parent: Option<FolderId>,
        owner: &OwnerId,
        kind: ItemKind,
        exclude: Option<ItemRef>,
    ) -> AppResult<Option<Entry>> {
        let found = self
            .store
            .find_child_by_name(parent, owner, kind, name)
            .await?;
        Ok(found.filter(|entry| Some(entry.item_ref()) != exclude))
    }

    /// Names of the `kind` children of `parent`.
    pub async fn sibling_names(
        &self,
        parent: Option<FolderId>,
        owner: &OwnerId,
        kind: ItemKind,
    ) -> AppResult<Vec<String>> {
        Ok(self
            .store
            .list_children(parent, owner, kind)
            .await?
            .into_iter()
            .map(|entry| entry.name().to_string())
            .collect())
    }

    async fn walk(&self, root: FolderId, owner: &OwnerId, with_files: bool) -> AppResult<Subtree> {
        self.require_folder(root, owner).await?;

        let mut subtree = Subtree::default();
        let mut visited = HashSet::from([root]);
        let mut queue = VecDeque::from([root]);

        while let Some(current) = queue.pop_front() {
            if with_files {
                let files = self
                    .store
                    .list_children(Some(current), owner, ItemKind::File)
                    .await?;
                subtree
                    .files
                    .extend(files.into_iter().filter_map(Entry::into_file));
            }

            let children = self
                .store
                .list_children(Some(current), owner, ItemKind::Folder)
                .await?;
            for child in children.into_iter().filter_map(Entry::into_folder) {
                if !visited.insert(child.id) {
                    return Err(self.cycle_detected(child.id));
                }
                if subtree.folders.len() >= self.limits.max_descendants {
                    return Err(AppError::internal(format!(
                        "Folder {root} has more than {} descendants",
                        self.limits.max_descendants
                    )));
                }
                queue.push_back(child.id);
                subtree.folders.push(child);
            }
        }

        debug!(
            folder_id = %root,
            folders = subtree.folders.len(),
            files = subtree.files.len(),
            "Enumerated subtree"
        );
        Ok(subtree)
    }

    async fn parent_of(&self, id: FolderId, owner: &OwnerId) -> AppResult<Option<FolderId>> {
        Ok(self.require_parent(id, owner).await?.parent_id)
    }

    /// A folder referenced as someone's parent must exist.
    async fn require_parent(&self, id: FolderId, owner: &OwnerId) -> AppResult<Folder> {
        self.store
            .get(ItemRef::Folder(id), owner)
            .await?
            .and_then(Entry::into_folder)
            .ok_or_else(|| {
                error!(folder_id = %id, "Parent chain references a missing folder");
                AppError::internal(format!("Parent folder {id} is missing"))
            })
    }

    fn cycle_detected(&self, at: FolderId) -> AppError {
        error!(folder_id = %at, "Cycle detected in folder tree");
        AppError::internal(format!("Folder tree contains a cycle at {at}"))
    }

    fn too_deep(&self, start: FolderId) -> AppError {
        error!(folder_id = %start, limit = self.limits.max_tree_depth, "Folder chain too deep");
        AppError::internal(format!(
            "Folder {start} is nested deeper than {} levels",
            self.limits.max_tree_depth
        ))
    }
}
