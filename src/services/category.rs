//! Category service
//!
//! Categories form a tree through `parent_id`. Moves that would put a
//! category under itself or one of its descendants are rejected, so the
//! service never creates a cycle.

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Category, CategoryId, FlowType};
use crate::storage::Storage;

use super::aggregation::descendants;

/// Service for category management
pub struct CategoryService<'a> {
    storage: &'a Storage,
}

/// Changes to a category; `None` leaves a field as it is
#[derive(Debug, Clone, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub flow: Option<FlowType>,
    /// `Some(None)` moves the category to the top level
    pub parent_id: Option<Option<CategoryId>>,
}

/// What a category deletion changed
#[derive(Debug, Clone)]
pub struct DeletedCategory {
    pub category: Category,
    /// Children moved up to the deleted category's parent
    pub children_moved: usize,
}

fn require_parent(storage: &Storage, parent_id: CategoryId) -> LedgerResult<()> {
    if storage.categories.exists(parent_id)? {
        Ok(())
    } else {
        Err(LedgerError::category_not_found(parent_id.to_string()))
    }
}

impl<'a> CategoryService<'a> {
    /// Create a new category service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a category, optionally under a parent
    pub fn create(
        &self,
        name: &str,
        flow: FlowType,
        parent_id: Option<CategoryId>,
    ) -> LedgerResult<Category> {
        let mut category = Category::new(name.trim(), flow);
        category.parent_id = parent_id;
        category
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        self.storage.transaction(|s| {
            if let Some(parent_id) = parent_id {
                require_parent(s, parent_id)?;
            }
            s.categories.upsert(category.clone())
        })?;

        tracing::info!(category_id = %category.id, name = %category.name, "category created");
        Ok(category)
    }

    /// Get a category by ID
    pub fn get(&self, id: CategoryId) -> LedgerResult<Category> {
        self.storage
            .categories
            .get(id)?
            .ok_or_else(|| LedgerError::category_not_found(id.to_string()))
    }

    /// Find a category by name, full ID or short ID
    pub fn find(&self, identifier: &str) -> LedgerResult<Option<Category>> {
        if let Some(category) = self.storage.categories.get_by_name(identifier)? {
            return Ok(Some(category));
        }
        if let Ok(id) = identifier.parse::<CategoryId>() {
            return self.storage.categories.get(id);
        }
        Ok(self
            .storage
            .categories
            .get_all()?
            .into_iter()
            .find(|c| c.id.short() == identifier))
    }

    /// All categories
    pub fn list(&self) -> LedgerResult<Vec<Category>> {
        self.storage.categories.get_all()
    }

    /// Direct children of a category
    pub fn children(&self, id: CategoryId) -> LedgerResult<Vec<Category>> {
        self.storage.categories.get_children(id)
    }

    /// Update a category
    pub fn update(&self, id: CategoryId, changes: CategoryChanges) -> LedgerResult<Category> {
        let category = self.storage.transaction(|s| {
            let mut category = s
                .categories
                .get(id)?
                .ok_or_else(|| LedgerError::category_not_found(id.to_string()))?;

            if let Some(name) = &changes.name {
                category.name = name.trim().to_string();
            }
            if let Some(flow) = changes.flow {
                category.flow = flow;
            }
            if let Some(parent_id) = changes.parent_id {
                if let Some(new_parent) = parent_id {
                    if new_parent == id {
                        return Err(LedgerError::Validation(
                            "A category cannot be its own parent".into(),
                        ));
                    }
                    require_parent(s, new_parent)?;
                    let all = s.categories.get_all()?;
                    if descendants(&all, id).contains(&new_parent) {
                        return Err(LedgerError::Validation(format!(
                            "Cannot move '{}' under one of its own sub-categories",
                            category.name
                        )));
                    }
                }
                category.set_parent(parent_id);
            }

            category.updated_at = chrono::Utc::now();
            category
                .validate()
                .map_err(|e| LedgerError::Validation(e.to_string()))?;
            s.categories.upsert(category.clone())?;
            Ok(category)
        })?;

        tracing::info!(category_id = %category.id, "category updated");
        Ok(category)
    }

    /// Delete a category
    ///
    /// Children move up to the deleted category's parent. Transactions keep
    /// their reference, which then dangles and is ignored by aggregation.
    pub fn delete(&self, id: CategoryId) -> LedgerResult<DeletedCategory> {
        let deleted = self.storage.transaction(|s| {
            let category = s
                .categories
                .get(id)?
                .ok_or_else(|| LedgerError::category_not_found(id.to_string()))?;

            let children = s.categories.get_children(id)?;
            let children_moved = children.len();
            for mut child in children {
                child.set_parent(category.parent_id);
                s.categories.upsert(child)?;
            }
            s.categories.delete(id)?;

            Ok(DeletedCategory {
                category,
                children_moved,
            })
        })?;

        tracing::info!(
            category_id = %id,
            children_moved = deleted.children_moved,
            "category deleted"
        );
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::LedgerPaths;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_create_with_parent() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);

        let housing = service.create("Housing", FlowType::Expense, None).unwrap();
        let rent = service
            .create("Rent", FlowType::Expense, Some(housing.id))
            .unwrap();

        assert_eq!(rent.parent_id, Some(housing.id));
        assert_eq!(service.children(housing.id).unwrap().len(), 1);

        let err = service
            .create("Orphan", FlowType::Expense, Some(CategoryId::new()))
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(service.create(" ", FlowType::Neutral, None).unwrap_err().is_validation());
    }

    #[test]
    fn test_move_under_descendant_rejected() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);
        let a = service.create("A", FlowType::Expense, None).unwrap();
        let b = service.create("B", FlowType::Expense, Some(a.id)).unwrap();
        let c = service.create("C", FlowType::Expense, Some(b.id)).unwrap();

        let err = service
            .update(
                a.id,
                CategoryChanges {
                    parent_id: Some(Some(c.id)),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_validation());

        let err = service
            .update(
                a.id,
                CategoryChanges {
                    parent_id: Some(Some(a.id)),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_validation());

        // Moving a leaf to the top level is fine
        let moved = service
            .update(
                c.id,
                CategoryChanges {
                    parent_id: Some(None),
                    name: Some("C2".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(moved.parent_id, None);
        assert_eq!(moved.name, "C2");
        assert_eq!(service.get(a.id).unwrap().parent_id, None);
    }

    #[test]
    fn test_delete_reparents_children() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);
        let root = service.create("Root", FlowType::Expense, None).unwrap();
        let middle = service.create("Middle", FlowType::Expense, Some(root.id)).unwrap();
        let leaf1 = service.create("Leaf1", FlowType::Expense, Some(middle.id)).unwrap();
        let leaf2 = service.create("Leaf2", FlowType::Expense, Some(middle.id)).unwrap();

        let deleted = service.delete(middle.id).unwrap();
        assert_eq!(deleted.children_moved, 2);

        assert_eq!(service.get(leaf1.id).unwrap().parent_id, Some(root.id));
        assert_eq!(service.get(leaf2.id).unwrap().parent_id, Some(root.id));
        assert!(service.get(middle.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_find() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);
        let food = service.create("Food", FlowType::Expense, None).unwrap();

        assert_eq!(service.find("food").unwrap().unwrap().id, food.id);
        assert_eq!(service.find(&food.id.short()).unwrap().unwrap().id, food.id);
        assert!(service.find("Fuel").unwrap().is_none());
    }
}
