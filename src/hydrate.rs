//! Hydration: expand registered custom elements inside a parsed tree
//!
//! Each registered tag is rendered on the server and its output replaces the
//! tag's children. The walk continues into the new children, so elements
//! introduced by another element's output are expanded as well.

use std::rc::Rc;

use crate::config::RenderConfig;
use crate::element::{ComponentInstance, Registry};
use crate::html::{self, Node, TagNode};
use crate::log::{self, LogSink};
use crate::RenderError;

struct Hydrator<'h> {
    registry: &'h Registry,
    config: &'h RenderConfig,
    sink: &'h Rc<dyn LogSink>,
    expansions: usize,
}

impl<'h> Hydrator<'h> {
    /// Depth first, in document order. The depth paired with each node
    /// counts the custom elements expanded on the path to it.
    fn walk(&mut self, nodes: &mut [Node]) -> Result<(), RenderError> {
        let mut stack: Vec<(&mut Node, usize)> = nodes.iter_mut().rev().map(|node| (node, 0)).collect();
        while let Some((node, depth)) = stack.pop() {
            if let Node::Tag(tag) = node {
                let expanded = self.expand(tag, depth)?;
                let depth = if expanded { depth + 1 } else { depth };
                stack.extend(tag.children.iter_mut().rev().map(|child| (child, depth)));
            }
        }
        Ok(())
    }

    fn expand(&mut self, tag: &mut TagNode, depth: usize) -> Result<bool, RenderError> {
        if tag.void_element {
            return Ok(false);
        }
        let Some(definition) = self.registry.get(&tag.name) else {
            return Ok(false);
        };
        if depth >= self.config.max_hydration_depth {
            return Err(RenderError::HydrationDepth {
                name: tag.name.clone(),
                depth,
            });
        }

        let attrs = definition.coerce_attrs(&tag.attrs, log::gate(self.config.dev, &**self.sink));
        let instance = ComponentInstance::detached(
            Rc::clone(definition),
            attrs,
            self.config.clone(),
            Rc::clone(self.sink),
        );
        let markup = instance.render_to_string()?;
        tag.children = html::parse(&markup);
        self.expansions += 1;
        tracing::debug!(element = %tag.name, depth, children = tag.children.len(), "hydrated");
        Ok(true)
    }
}

/// Expand every registered element in `nodes`, depth first. Returns how many
/// elements were expanded.
pub fn hydrate(
    nodes: &mut [Node],
    registry: &Registry,
    config: &RenderConfig,
    sink: &Rc<dyn LogSink>,
) -> Result<usize, RenderError> {
    let mut hydrator = Hydrator {
        registry,
        config,
        sink,
        expansions: 0,
    };
    hydrator.walk(nodes)?;
    Ok(hydrator.expansions)
}
