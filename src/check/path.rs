use std::fmt;

/// One step from a value into one of its parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Record field.
    Field(String),
    /// List element.
    Index(usize),
    /// Value stored under a map key.
    Key(String),
    /// The map key itself.
    MapKey(String),
    /// Tuple position.
    Position(usize),
}

/// Where a violation was found, outermost segment first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<PathSegment>);

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn field(name: impl Into<String>) -> Self {
        Self(vec![PathSegment::Field(name.into())])
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }

    /// `self` followed by every segment of `rest`.
    pub fn join(&self, rest: &Path) -> Path {
        Self(self.0.iter().chain(&rest.0).cloned().collect())
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl fmt::Display for Path {
    /// `field "items"[2]["x"]`, `field "pair".1`, `field "d"<key "k">`, `(root)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(root)");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => write!(f, "field {name:?}")?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                PathSegment::Key(key) => write!(f, "[{key:?}]")?,
                PathSegment::MapKey(key) => write!(f, "<key {key:?}>")?,
                PathSegment::Position(pos) => write!(f, ".{pos}")?,
            }
        }
        Ok(())
    }
}
