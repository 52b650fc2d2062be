//! Typed access to named element properties
//!
//! A lookup that misses the element or the property is a reported error,
//! not a silent no-op; a value of the wrong type is refused before it
//! reaches the element.

use crate::engine::element::PropertyValue;
use crate::engine::graph::Graph;
use crate::error::{CastError, CastResult};
use std::mem;

/// Read one property of a named element
pub(crate) fn get(graph: &Graph, element: &str, property: &str) -> CastResult<PropertyValue> {
    let elem = graph.by_name(element).ok_or_else(|| CastError::MissingElement {
        element: element.to_string(),
    })?;
    elem.get_property(property)
        .ok_or_else(|| CastError::MissingProperty {
            element: element.to_string(),
            property: property.to_string(),
        })
}

/// Write one property of a named element, keeping its type
pub(crate) fn set(
    graph: &Graph,
    element: &str,
    property: &str,
    value: PropertyValue,
) -> CastResult<()> {
    let elem = graph.by_name(element).ok_or_else(|| CastError::MissingElement {
        element: element.to_string(),
    })?;
    let current = elem
        .get_property(property)
        .ok_or_else(|| CastError::MissingProperty {
            element: element.to_string(),
            property: property.to_string(),
        })?;
    if mem::discriminant(&current) != mem::discriminant(&value) {
        return Err(CastError::PropertyType {
            element: element.to_string(),
            property: property.to_string(),
        });
    }

    elem.set_property(property, value);
    Ok(())
}

/// Read an unsigned property value
pub(crate) fn get_uint(graph: &Graph, element: &str, property: &str) -> CastResult<u32> {
    match get(graph, element, property)? {
        PropertyValue::Uint(value) => Ok(value),
        _ => Err(CastError::PropertyType {
            element: element.to_string(),
            property: property.to_string(),
        }),
    }
}

/// Write an unsigned property value
pub(crate) fn set_uint(graph: &Graph, element: &str, property: &str, value: u32) -> CastResult<()> {
    set(graph, element, property, PropertyValue::Uint(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor;

    fn graph() -> Graph {
        descriptor::parse("testsrc ! encoder name=encoder ! payloader name=payloader ! appsink")
            .unwrap()
    }

    #[test]
    fn uint_round_trip() {
        let graph = graph();
        set_uint(&graph, "payloader", "session-id", 77).unwrap();
        assert_eq!(get_uint(&graph, "payloader", "session-id").unwrap(), 77);
    }

    #[test]
    fn missing_element_is_reported() {
        let graph = graph();
        assert!(matches!(
            get_uint(&graph, "muxer", "bitrate"),
            Err(CastError::MissingElement { element }) if element == "muxer"
        ));
    }

    #[test]
    fn missing_property_is_reported() {
        let graph = graph();
        assert!(matches!(
            get(&graph, "encoder", "quantizer"),
            Err(CastError::MissingProperty { element, property })
                if element == "encoder" && property == "quantizer"
        ));
    }

    #[test]
    fn type_mismatch_is_refused() {
        let graph = graph();
        let err = set(
            &graph,
            "encoder",
            "bitrate",
            PropertyValue::Str("fast".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, CastError::PropertyType { .. }));

        // the stored value is untouched
        assert_eq!(get_uint(&graph, "encoder", "bitrate").unwrap(), 2048);
    }
}
