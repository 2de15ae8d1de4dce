use core::fmt;

use indexmap::{IndexMap, map::Entry};

use crate::{
    datasource::SourceFiles,
    resource::{ResId, Resource},
};

/// The full working set of documents for one conversion run.
#[derive(Clone, Default)]
pub struct ResourceMap {
    resources: IndexMap<ResId, Resource>,
}

impl fmt::Debug for ResourceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.resources.keys()).finish()
    }
}

impl ResourceMap {
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn insert(&mut self, resource: Resource) -> Result<(), Conflict> {
        match self.resources.entry(resource.id().clone()) {
            Entry::Occupied(_) => Err(Conflict { resource }),
            Entry::Vacant(entry) => {
                entry.insert(resource);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: &ResId) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn get_mut(&mut self, id: &ResId) -> Option<&mut Resource> {
        self.resources.get_mut(id)
    }

    pub fn remove(&mut self, id: &ResId) -> Option<Resource> {
        self.resources.shift_remove(id)
    }

    /// Materialized key list, so a pass may delete entries while walking the
    /// collection without invalidating any live iterator.
    pub fn ids(&self) -> Vec<ResId> {
        self.resources.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Resource> + DoubleEndedIterator {
        self.resources.values()
    }

    pub fn iter_mut(
        &mut self,
    ) -> impl ExactSizeIterator<Item = &mut Resource> + DoubleEndedIterator {
        self.resources.values_mut()
    }
}

/// Shared mutable state threaded through every pass: the document collection
/// plus the side-table of extracted auxiliary file contents.
#[derive(Debug, Clone, Default)]
pub struct Resources {
    pub map: ResourceMap,
    pub source_files: SourceFiles,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub resource: Resource,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "may not add resource with an already registered id `{}`",
            self.resource.id()
        )
    }
}

impl std::error::Error for Conflict {}
