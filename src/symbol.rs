use lasso::{Spur, ThreadedRodeo};

/// Interned identifier for an operator tag or an input name.
pub type FuncId = Spur;

/// Tag of the synthetic compound that bundles a graph's outputs into one term.
pub const OUTPUTS_TAG: &str = "__outputs__";

/// Interner for operator tags and placeholder names.
///
/// Guarantees:
/// - Same string always produces same FuncId
/// - Different strings always produce different FuncIds
/// - FuncId can be resolved back to the original string
pub struct SymbolStore {
    rodeo: ThreadedRodeo,
}

impl SymbolStore {
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Intern a symbol string, returning its unique FuncId.
    pub fn intern(&self, name: &str) -> FuncId {
        self.rodeo.get_or_intern(name)
    }

    /// Intern an operator name after normalising it.
    ///
    /// Returns the tag together with the output index carried by the raw
    /// name, if any (see [`normalize_op_name`]).
    pub fn intern_op(&self, raw: &str) -> (FuncId, Option<u32>) {
        let (name, output) = normalize_op_name(raw);
        (self.intern(&name), output)
    }

    /// Resolve a FuncId back to its string representation.
    pub fn resolve(&self, id: FuncId) -> Option<&str> {
        self.rodeo.try_resolve(&id)
    }

    /// Get the FuncId for a symbol if it exists, without interning.
    pub fn get(&self, name: &str) -> Option<FuncId> {
        self.rodeo.get(name)
    }

    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for SymbolStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalise an exported operator name to its bare operator tag.
///
/// Exported graphs name nodes like `"model/Add_3:0"`: a namespace path, the
/// operator type, a uniqueness suffix and an output index. Only the operator
/// type identifies the operation, so `"scope/Add_1:0"`, `"add"` and
/// `"Add_2"` all normalise to `"add"`. The output index is returned
/// separately because it does distinguish values.
pub fn normalize_op_name(raw: &str) -> (String, Option<u32>) {
    let base = raw.rsplit('/').next().unwrap_or(raw);

    let (base, output) = match base.rsplit_once(':') {
        Some((head, idx)) => match idx.parse::<u32>() {
            Ok(n) => (head, Some(n)),
            Err(_) => (base, None),
        },
        None => (base, None),
    };

    let base = match base.rsplit_once('_') {
        Some((head, suffix))
            if !head.is_empty()
                && !suffix.is_empty()
                && suffix.chars().all(|c| c.is_ascii_digit()) =>
        {
            head
        }
        _ => base,
    };

    (base.to_ascii_lowercase(), output)
}

#[cfg(test)]
#[path = "tests/symbol.rs"]
mod tests;
