use crate::{
    element::Element,
    error::{Error, Result},
    MAX_DEPTH,
};

/// Tracks how many elements with content are open in a token stream.
#[derive(Clone, Debug, Default)]
pub struct DepthTracker {
    depth: usize,
}

impl DepthTracker {
    /// Create a new depth tracker
    pub fn new() -> Self {
        Self { depth: 0 }
    }

    /// Update the depth tracker on each new element to serialize or parse.
    pub fn update_elem(&mut self, elem: &Element) -> Result<()> {
        match elem {
            Element::Tag { content: true, .. } => {
                self.depth += 1;
                // Check to see if we hit the nesting limit
                if self.depth > MAX_DEPTH {
                    return Err(Error::ParseLimit("Depth limit exceeded".to_string()));
                }
            }
            Element::End => {
                self.depth = self
                    .depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::BadEncode("END token with no open element".into()))?;
            }
            _ => (),
        }
        Ok(())
    }

    /// Number of currently open elements.
    pub fn depth(&self) -> usize {
        self.depth
    }
}
