//! Parsed pipeline graph with by-name element lookup

use crate::engine::element::{Element, ElementKind};
use crate::error::ParseError;
use std::collections::HashMap;
use std::sync::Arc;

/// A validated, linked element graph
///
/// Exactly one source at the head, exactly one sink at the tail,
/// pass-through transforms in between. The topology is fixed for the
/// lifetime of the pipeline.
pub struct Graph {
    elements: Vec<Arc<Element>>,
    by_name: HashMap<String, usize>,
}

impl Graph {
    pub(crate) fn new(elements: Vec<Arc<Element>>) -> Result<Graph, ParseError> {
        if elements.is_empty() {
            return Err(ParseError::Empty);
        }
        if !elements.first().unwrap().kind().is_source() {
            return Err(ParseError::MissingSource);
        }
        if !elements.last().unwrap().kind().is_sink() {
            return Err(ParseError::MissingSink);
        }
        for elem in &elements[1..elements.len() - 1] {
            if elem.kind().is_source() || elem.kind().is_sink() {
                return Err(ParseError::MisplacedElement(elem.name().to_string()));
            }
        }

        let mut by_name = HashMap::new();
        for (index, elem) in elements.iter().enumerate() {
            if by_name.insert(elem.name().to_string(), index).is_some() {
                return Err(ParseError::DuplicateName(elem.name().to_string()));
            }
        }

        Ok(Graph { elements, by_name })
    }

    /// Locate an element by its addressable name
    pub fn by_name(&self, name: &str) -> Option<Arc<Element>> {
        self.by_name
            .get(name)
            .map(|&index| Arc::clone(&self.elements[index]))
    }

    /// The head source element
    pub fn source(&self) -> Arc<Element> {
        Arc::clone(self.elements.first().unwrap())
    }

    /// The tail sink element
    pub fn sink(&self) -> Arc<Element> {
        Arc::clone(self.elements.last().unwrap())
    }

    /// The pass-through transforms between source and sink, in link order
    pub fn transforms(&self) -> &[Arc<Element>] {
        &self.elements[1..self.elements.len() - 1]
    }

    /// The sample-exposing sink, if the graph terminates in one
    pub fn appsink(&self) -> Option<Arc<Element>> {
        let sink = self.sink();
        (sink.kind() == ElementKind::AppSink).then_some(sink)
    }

    /// Number of elements in the graph
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.elements.iter().map(|e| e.name()).collect();
        f.debug_struct("Graph").field("elements", &names).finish()
    }
}
