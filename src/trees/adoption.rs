//! The adoption agency algorithm, which untangles misnested formatting elements such as
//! `<b><i>text</b> more</i>` by cloning formatting elements around block boundaries.

use crate::dom::Namespace;
use crate::trees::construction_dispatcher::{FormatEntry, TreeConstructionDispatcher};
use crate::trees::scopes;
use crate::Reader;

/// What the caller should do after the algorithm ran.
pub(crate) enum AdoptionResult {
    /// The token was fully handled.
    Handled,
    /// Abort and treat the end tag with the "any other end tag" rules instead.
    AnyOtherEndTag,
}

// the spec's fixed iteration bounds; they guarantee termination on any input
const OUTER_ITERATION_LIMIT: usize = 8;
const INNER_ITERATION_LIMIT: usize = 3;

impl<R: Reader> TreeConstructionDispatcher<R> {
    pub(crate) fn run_adoption_agency_algorithm(&mut self, subject: &str) -> AdoptionResult {
        // If the current node is the subject and not an active formatting element, it just
        // gets popped.
        if let Some(current) = self.current_node() {
            if self.is_html_element(current, subject)
                && self.active_formatting_position(current).is_none()
            {
                self.stack_of_open_elements.pop();
                return AdoptionResult::Handled;
            }
        }

        for _ in 0..OUTER_ITERATION_LIMIT {
            // locate the formatting element: the last entry for `subject` above the last marker
            let mut formatting = None;
            for (i, entry) in self
                .list_of_active_formatting_elements
                .iter()
                .enumerate()
                .rev()
            {
                match entry {
                    FormatEntry::Marker => break,
                    FormatEntry::Element { node, tag } => {
                        if tag.name == subject {
                            formatting = Some((i, *node, tag.clone()));
                            break;
                        }
                    }
                }
            }

            let (formatting_entry_index, formatting_element, formatting_tag) = match formatting {
                Some(found) => found,
                None => return AdoptionResult::AnyOtherEndTag,
            };

            let formatting_stack_index = match self
                .stack_of_open_elements
                .iter()
                .position(|&node| node == formatting_element)
            {
                Some(index) => index,
                None => {
                    self.parse_error();
                    self.list_of_active_formatting_elements
                        .remove(formatting_entry_index);
                    return AdoptionResult::Handled;
                }
            };

            if !self.has_node_in_scope(formatting_element) {
                self.parse_error();
                return AdoptionResult::Handled;
            }

            if self.current_node() != Some(formatting_element) {
                self.parse_error();
            }

            // the furthest block: the lowest "special" element below the formatting element
            let furthest_block_index = self.stack_of_open_elements
                [formatting_stack_index + 1..]
                .iter()
                .position(|&node| {
                    let (namespace, name) = self.elem_name(node);
                    scopes::special(namespace, name)
                })
                .map(|offset| formatting_stack_index + 1 + offset);

            let furthest_block_index = match furthest_block_index {
                Some(index) => index,
                None => {
                    // no furthest block: pop up to and including the formatting element
                    self.stack_of_open_elements.truncate(formatting_stack_index);
                    self.list_of_active_formatting_elements
                        .remove(formatting_entry_index);
                    return AdoptionResult::Handled;
                }
            };
            let furthest_block = self.stack_of_open_elements[furthest_block_index];

            let common_ancestor = self.stack_of_open_elements[formatting_stack_index - 1];
            let mut bookmark = formatting_entry_index;

            let mut node_index = furthest_block_index;
            let mut last_node = furthest_block;

            for inner_counter in 1.. {
                node_index -= 1;
                let mut node = self.stack_of_open_elements[node_index];
                if node == formatting_element {
                    break;
                }

                let node_entry = self.active_formatting_position(node);
                if inner_counter > INNER_ITERATION_LIMIT {
                    if let Some(entry_index) = node_entry {
                        self.list_of_active_formatting_elements.remove(entry_index);
                        if entry_index < bookmark {
                            bookmark -= 1;
                        }
                        self.stack_of_open_elements.remove(node_index);
                        continue;
                    }
                }

                let entry_index = match node_entry {
                    Some(entry_index) => entry_index,
                    None => {
                        self.stack_of_open_elements.remove(node_index);
                        continue;
                    }
                };

                // replace the entry and the stack slot with a fresh clone
                let tag = match &self.list_of_active_formatting_elements[entry_index] {
                    FormatEntry::Element { tag, .. } => tag.clone(),
                    FormatEntry::Marker => unreachable!("entry index points at an element"),
                };
                let clone = self.create_element_for_token(&tag, Namespace::Html);
                self.list_of_active_formatting_elements[entry_index] = FormatEntry::Element {
                    node: clone,
                    tag,
                };
                self.stack_of_open_elements[node_index] = clone;
                node = clone;

                if last_node == furthest_block {
                    bookmark = entry_index + 1;
                }

                self.document.append(node, last_node);
                last_node = node;
            }

            self.insert_element(last_node, Some(common_ancestor));

            let clone = self.create_element_for_token(&formatting_tag, Namespace::Html);
            // move the furthest block's children onto the clone, then hang the clone below it
            let children = self.document.node(furthest_block).children.clone();
            for child in children {
                self.document.append(clone, child);
            }
            self.document.append(furthest_block, clone);

            if let Some(old_entry) = self.active_formatting_position(formatting_element) {
                self.list_of_active_formatting_elements.remove(old_entry);
                if old_entry < bookmark {
                    bookmark -= 1;
                }
            }
            self.list_of_active_formatting_elements.insert(
                bookmark,
                FormatEntry::Element {
                    node: clone,
                    tag: formatting_tag,
                },
            );

            self.remove_from_stack(formatting_element);
            let furthest_block_index = self
                .stack_of_open_elements
                .iter()
                .position(|&node| node == furthest_block)
                .expect("furthest block fell off the stack");
            self.stack_of_open_elements
                .insert(furthest_block_index + 1, clone);
        }

        AdoptionResult::Handled
    }
}
