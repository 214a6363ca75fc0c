//! Widget identity
//!
//! Ids are FNV-1a hashes chained through the id stack, so the same label in
//! two different scopes yields two different widgets. The hash is stable
//! across runs, which lets header state persist in the settings file by id.

/// Hashed widget identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct WidgetId(pub u64);

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(seed: u64, bytes: &[u8]) -> u64 {
    bytes.iter().fold(seed, |hash, byte| (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME))
}

impl WidgetId {
    /// Root seed
    pub const ROOT: Self = Self(FNV_OFFSET);

    /// Child id for a label
    ///
    /// Everything from `###` on replaces the whole label as the identity, and
    /// a leading `##` hides the label from display without changing the id.
    pub fn child_str(self, label: &str) -> Self {
        let key = label.find("###").map_or(label, |i| &label[i..]);
        Self(fnv1a(self.0, key.as_bytes()))
    }

    /// Child id for an integer
    pub fn child_int(self, value: u64) -> Self {
        Self(fnv1a(self.0 ^ 0x9e37_79b9_7f4a_7c15, &value.to_le_bytes()))
    }
}

/// Visible part of a label (text before any `##`)
pub fn display_label(label: &str) -> &str {
    label.find("##").map_or(label, |i| &label[..i])
}

/// Stack of id seeds
#[derive(Debug, Clone)]
pub struct IdStack {
    stack: Vec<WidgetId>,
}

impl IdStack {
    /// Stack rooted at `seed`
    pub fn new(seed: WidgetId) -> Self {
        Self { stack: vec![seed] }
    }

    /// Current seed
    pub fn top(&self) -> WidgetId {
        self.stack.last().copied().unwrap_or(WidgetId::ROOT)
    }

    /// Id of `label` under the current seed
    pub fn id(&self, label: &str) -> WidgetId {
        self.top().child_str(label)
    }

    /// Push a string scope
    pub fn push_str(&mut self, label: &str) {
        let id = self.id(label);
        self.stack.push(id);
    }

    /// Push an integer scope
    pub fn push_int(&mut self, value: u64) {
        let id = self.top().child_int(value);
        self.stack.push(id);
    }

    /// Pop a scope; the root seed cannot be popped
    pub fn pop(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    /// Pushed scopes above the root
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }
}
