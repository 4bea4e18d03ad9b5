use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::trace;

use crate::ast::{Query, next_owner};
use crate::error::{QueryError, QueryResult};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier pattern"));

static QUALIFIED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("valid class name pattern")
});

/// Checks that `name` is a plain identifier (alias, field or reference name).
pub fn check_identifier(name: &str) -> QueryResult<()> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(QueryError::InvalidIdentifier(name.to_string()))
    }
}

/// Checks that `name` is a possibly dot-qualified class name.
pub fn check_class_name(name: &str) -> QueryResult<()> {
    if QUALIFIED_NAME.is_match(name) {
        Ok(())
    } else {
        Err(QueryError::InvalidIdentifier(name.to_string()))
    }
}

/// Something a query reads from.
///
/// Sources are shared through `Arc`. The handle is the source's identity:
/// binding the same handle twice is an error, while two handles for the same
/// class make a self-join.
#[derive(Debug)]
pub enum Source {
    /// A class (table-like entity), by qualified name
    Class(String),
    /// A frozen query used as a derived source
    Subquery(Arc<Query>),
}

impl Source {
    /// Creates a class source after checking the name.
    pub fn class(name: impl Into<String>) -> QueryResult<Arc<Source>> {
        let name = name.into();
        check_class_name(&name)?;
        Ok(Arc::new(Source::Class(name)))
    }

    /// Creates a derived source from a frozen query.
    pub fn subquery(query: Arc<Query>) -> Arc<Source> {
        Arc::new(Source::Subquery(query))
    }

    /// Short description for messages.
    pub fn describe(&self) -> String {
        match self {
            Source::Class(name) => name.clone(),
            Source::Subquery(_) => "subquery".to_string(),
        }
    }
}

/// Index of an alias in its query's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AliasId {
    pub(crate) owner: u64,
    pub(crate) index: usize,
}

impl AliasId {
    pub(crate) const fn new(owner: u64, index: usize) -> Self {
        AliasId { owner, index }
    }

    pub fn index(self) -> usize {
        self.index
    }
}

/// A name bound to one source.
#[derive(Debug, Clone)]
pub struct Alias {
    name: String,
    source: Arc<Source>,
}

impl Alias {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &Arc<Source> {
        &self.source
    }
}

/// Registry of the aliases of one query.
///
/// Entries keep registration order, which is the order of the FROM list.
/// The two maps are lookup indexes only and never drive iteration.
#[derive(Debug)]
pub struct AliasRegistry {
    /// Tag stamped on every [`AliasId`] this registry hands out.
    owner: u64,
    entries: Vec<Alias>,
    /// Source handle address to alias. The registry holds a clone of every
    /// handle, so an address cannot be reused while the entry exists.
    by_source: HashMap<usize, AliasId>,
    by_name: HashMap<String, AliasId>,
    next_generated: usize,
}

impl Default for AliasRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn source_key(source: &Arc<Source>) -> usize {
    Arc::as_ptr(source) as usize
}

impl AliasRegistry {
    pub fn new() -> Self {
        AliasRegistry {
            owner: next_owner(),
            entries: Vec::new(),
            by_source: HashMap::new(),
            by_name: HashMap::new(),
            next_generated: 0,
        }
    }

    pub(crate) fn owner(&self) -> u64 {
        self.owner
    }

    /// Binds `source` under the next free generated name (`a1_`, `a2_`, ...).
    pub fn bind(&mut self, source: &Arc<Source>) -> QueryResult<AliasId> {
        self.check_unbound(source)?;
        let name = loop {
            self.next_generated += 1;
            let candidate = format!("a{}_", self.next_generated);
            if !self.by_name.contains_key(&candidate) {
                break candidate;
            }
        };
        Ok(self.insert(source, name))
    }

    /// Binds `source` under a caller-chosen name.
    pub fn bind_as(&mut self, source: &Arc<Source>, name: &str) -> QueryResult<AliasId> {
        check_identifier(name)?;
        self.check_unbound(source)?;
        if self.by_name.contains_key(name) {
            return Err(QueryError::DuplicateAlias(name.to_string()));
        }
        Ok(self.insert(source, name.to_string()))
    }

    fn check_unbound(&self, source: &Arc<Source>) -> QueryResult<()> {
        match self.by_source.get(&source_key(source)) {
            Some(id) => Err(QueryError::DuplicateSource {
                source_name: source.describe(),
                alias: self.entries[id.index].name.clone(),
            }),
            None => Ok(()),
        }
    }

    fn insert(&mut self, source: &Arc<Source>, name: String) -> AliasId {
        let id = AliasId::new(self.owner, self.entries.len());
        trace!(alias = %name, source = %source.describe(), "bound source");
        self.by_source.insert(source_key(source), id);
        self.by_name.insert(name.clone(), id);
        self.entries.push(Alias { name, source: Arc::clone(source) });
        id
    }

    /// Returns the source bound to the alias `name`.
    pub fn resolve(&self, name: &str) -> QueryResult<&Arc<Source>> {
        let id = self.lookup(name)?;
        Ok(&self.entries[id.index].source)
    }

    /// Returns the id of the alias `name`.
    pub fn lookup(&self, name: &str) -> QueryResult<AliasId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| QueryError::UnknownAlias(name.to_string()))
    }

    pub fn get(&self, id: AliasId) -> QueryResult<&Alias> {
        self.entries
            .get(id.index)
            .filter(|_| id.owner == self.owner)
            .ok_or_else(|| QueryError::UnknownAlias(format!("#{}", id.index)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Aliases in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (AliasId, &Alias)> {
        self.entries.iter().enumerate().map(|(i, alias)| (AliasId::new(self.owner, i), alias))
    }
}
