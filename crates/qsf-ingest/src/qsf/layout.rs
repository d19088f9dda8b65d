//! Block and flow bookkeeping used only while a definition is parsed.

use std::collections::{BTreeMap, BTreeSet};

use qsf_model::Question;
use tracing::{debug, warn};

use super::elements::{BlockDescriptor, FlowNode};

/// Blocks, flow order and embedded-data fields collected from the elements.
#[derive(Debug, Default)]
pub(crate) struct Layout {
    blocks: Vec<BlockDescriptor>,
    /// Block IDs in flow order, nested flows flattened in place.
    flow: Vec<String>,
    /// Whether any flow element was seen.
    has_flow: bool,
    /// Synthesized embedded-data question IDs, in first-seen order.
    embedded: Vec<String>,
}

impl Layout {
    pub fn add_blocks(&mut self, blocks: Vec<BlockDescriptor>) {
        self.blocks.extend(blocks);
    }

    /// Record the flow and synthesize a pseudo-question per embedded-data field.
    pub fn add_flow(&mut self, nodes: &[FlowNode], questions: &mut BTreeMap<String, Question>) {
        self.has_flow = true;
        self.walk_flow(nodes, questions);
    }

    fn walk_flow(&mut self, nodes: &[FlowNode], questions: &mut BTreeMap<String, Question>) {
        for node in nodes {
            for field in &node.embedded_data {
                let name = field.field.trim();
                if name.is_empty() || self.embedded.iter().any(|known| known == name) {
                    continue;
                }
                if questions.contains_key(name) {
                    warn!(field = %name, "embedded data field shadows a question ID");
                    continue;
                }
                let mut question = Question::embedded_data(name);
                question.selector = field.variable_type.clone().unwrap_or_default();
                questions.insert(question.id.clone(), question);
                self.embedded.push(name.to_string());
            }

            if node.flow.is_empty() {
                if let Some(id) = node.id.as_deref().filter(|id| !id.is_empty()) {
                    self.flow.push(id.to_string());
                }
            } else {
                debug!(node_type = ?node.node_type, "flattening nested flow");
                self.walk_flow(&node.flow, questions);
            }
        }
    }

    /// Drop every question placed in a trash block; returns how many were removed.
    pub fn remove_trash(&self, questions: &mut BTreeMap<String, Question>) -> usize {
        let mut removed = 0;
        for block in self.blocks.iter().filter(|block| block.is_trash()) {
            for id in block.question_ids() {
                if questions.remove(id).is_some() {
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Export order: each flowed block's questions, then the embedded-data fields.
    ///
    /// Without any flow element the blocks are taken in declaration order.
    pub fn question_order(&self, questions: &BTreeMap<String, Question>) -> Vec<String> {
        let by_id: BTreeMap<&str, &BlockDescriptor> = self
            .blocks
            .iter()
            .filter(|block| !block.is_trash())
            .map(|block| (block.id.as_str(), block))
            .collect();

        let flow: Vec<&str> = if self.has_flow {
            self.flow.iter().map(String::as_str).collect()
        } else {
            self.blocks
                .iter()
                .filter(|block| !block.is_trash())
                .map(|block| block.id.as_str())
                .collect()
        };

        let mut seen = BTreeSet::new();
        let mut order = Vec::new();
        for block_id in flow {
            let Some(block) = by_id.get(block_id) else {
                if !self.is_trash_block(block_id) {
                    warn!(block = %block_id, "flow references an unknown block");
                }
                continue;
            };
            for id in block.question_ids() {
                if !questions.contains_key(id) {
                    warn!(block = %block_id, question = %id, "block references an unknown question");
                    continue;
                }
                if seen.insert(id) {
                    order.push(id.to_string());
                }
            }
        }

        for id in &self.embedded {
            if seen.insert(id.as_str()) && questions.contains_key(id) {
                order.push(id.clone());
            }
        }
        order
    }

    fn is_trash_block(&self, id: &str) -> bool {
        self.blocks
            .iter()
            .any(|block| block.id == id && block.is_trash())
    }
}
