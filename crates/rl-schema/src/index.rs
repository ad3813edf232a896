use rl_expr::KeyExpression;

/// The kind of an index (spec.md §3). Each kind is maintained by a distinct
/// maintainer in `rl-index`; the kind and [`IndexOptions`] together describe
/// everything a maintainer needs beyond the root expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexKind {
    Value,
    Count,
    Sum,
    Min,
    Max,
    Rank,
    Spatial,
    Vector,
}

/// Strategy used to build a [`IndexKind::Vector`] index online (spec.md
/// §4.G: inline maintenance is not supported for vector indexes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VectorStrategy {
    /// Exact, O(n) scan over the sidecar dense-array entries at query time.
    FlatScan,
    /// Builds an HNSW graph via the online indexer.
    HnswBatch,
}

/// Tuning and semantic knobs for an [`IndexDefinition`]. Which fields are
/// meaningful depends on `kind`; fields irrelevant to a kind are simply
/// ignored (e.g. `unique` for a `count` index).
#[derive(Clone, Debug, PartialEq)]
pub struct IndexOptions {
    /// `value` index only: reject a second record with the same evaluated
    /// key.
    pub unique: bool,
    /// `value` index only, requires `unique`: on conflict, delete the
    /// existing owner and write the new record instead of failing.
    pub replace_on_duplicate: bool,
    /// `count`/`sum`/`min`/`max`/`rank`: how many leading columns of
    /// `root_expression`'s evaluation form the grouping key, with the
    /// remaining trailing columns forming the aggregated/ranked value. A
    /// root expression with no grouping (a single global aggregate) uses 0.
    pub group_prefix_columns: usize,
    /// `spatial` index only: 2 or 3.
    pub spatial_dimensions: u8,
    /// `spatial` index only: bits of precision per dimension before
    /// interleaving (spec.md §4.G defaults: 18 for 2D, 16 for 3D).
    pub spatial_level: u8,
    /// `spatial` index only, 3D: inclusive altitude range used to normalize
    /// the third coordinate to `[0,1]`.
    pub altitude_range: Option<(f64, f64)>,
    /// `vector` index only: dimensionality of the stored vectors.
    pub vector_dimensions: usize,
    /// `vector` index only: build/query strategy.
    pub vector_strategy: VectorStrategy,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            unique: false,
            replace_on_duplicate: false,
            group_prefix_columns: 0,
            spatial_dimensions: 2,
            spatial_level: 18,
            altitude_range: None,
            vector_dimensions: 0,
            vector_strategy: VectorStrategy::FlatScan,
        }
    }
}

impl IndexOptions {
    pub fn unique() -> Self {
        Self { unique: true, ..Self::default() }
    }

    pub fn grouped(group_prefix_columns: usize) -> Self {
        Self { group_prefix_columns, ..Self::default() }
    }
}

/// A named index (spec.md §3, §4.G). `subspace_key` is the compact
/// identifier stored as the second element of every index entry's physical
/// key (keyspace tag `3`, see spec.md §3's persisted layout), distinct from
/// the index's human-readable `name` so the name can be arbitrarily long
/// without inflating every entry key.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexDefinition {
    name: String,
    kind: IndexKind,
    root_expression: KeyExpression,
    subspace_key: u16,
    /// `None` means universal: applicable to every record type in the
    /// schema.
    applicable_record_types: Option<Vec<String>>,
    options: IndexOptions,
}

impl IndexDefinition {
    pub fn new(
        name: impl Into<String>,
        kind: IndexKind,
        root_expression: KeyExpression,
        subspace_key: u16,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            root_expression,
            subspace_key,
            applicable_record_types: None,
            options: IndexOptions::default(),
        }
    }

    pub fn with_options(mut self, options: IndexOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_applicable_record_types(mut self, types: Vec<String>) -> Self {
        self.applicable_record_types = Some(types);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn root_expression(&self) -> &KeyExpression {
        &self.root_expression
    }

    pub fn subspace_key(&self) -> u16 {
        self.subspace_key
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Whether this index applies to `record_type_name`: universal (no
    /// restriction) or explicitly listed.
    pub fn applies_to(&self, record_type_name: &str) -> bool {
        match &self.applicable_record_types {
            None => true,
            Some(names) => names.iter().any(|n| n == record_type_name),
        }
    }

    pub fn applicable_record_types(&self) -> Option<&[String]> {
        self.applicable_record_types.as_deref()
    }
}

/// An immutable marker reserving an index name permanently (spec.md §3,
/// §4.K). Once recorded in a schema's `former_indexes`, a former index can
/// never be mutated, removed, or have its name reused by a live index.
#[derive(Clone, Debug, PartialEq)]
pub struct FormerIndex {
    name: String,
    added_version: u64,
    removed_version: u64,
}

impl FormerIndex {
    pub fn new(name: impl Into<String>, added_version: u64, removed_version: u64) -> Self {
        Self { name: name.into(), added_version, removed_version }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn added_version(&self) -> u64 {
        self.added_version
    }

    pub fn removed_version(&self) -> u64 {
        self.removed_version
    }
}
