//! The transformer pipeline: walks the raw object graph and normalizes it
//! into fully materialized values, hydrating indirect references through the
//! xref with per-document memoization.
//!
//! The pipeline is a composite of typed handlers; the root dispatches to the
//! first child that accepts the value, and handlers recurse back into the
//! root for their children.

use std::collections::{HashMap, HashSet};

use log::warn;

use crate::errors::PdfError;
use crate::filters::decode_stream;
use crate::object::{Dictionary, Object};
use crate::parser::ObjectParser;
use crate::xref::XRef;

/// Shared state of one resolution pass over a document.
pub struct TransformContext<'a, 'b> {
    pub parser: &'a mut ObjectParser<'b>,
    pub xref: &'a XRef,
    /// Memoized resolutions per `(object_number, generation)`.
    pub cache: &'a mut HashMap<(u32, u16), Object>,
    /// Cycle guard: references currently being resolved. A re-entrant
    /// lookup observes `Object::Null` instead of recursing forever.
    pub in_progress: &'a mut HashSet<(u32, u16)>,
}

/// One typed handler of the pipeline.
pub trait Transform {
    fn can_transform(&self, object: &Object) -> bool;
    fn transform(
        &self,
        object: Object,
        pipeline: &TransformerPipeline,
        ctx: &mut TransformContext,
    ) -> Result<Object, PdfError>;
}

/// The root transformer: a list of handlers tried in order.
pub struct TransformerPipeline {
    handlers: Vec<Box<dyn Transform>>,
}

impl Default for TransformerPipeline {
    fn default() -> Self {
        TransformerPipeline::standard()
    }
}

impl TransformerPipeline {
    /// The standard handler set: scalars, references, arrays, dictionaries
    /// and streams.
    pub fn standard() -> Self {
        TransformerPipeline {
            handlers: vec![
                Box::new(ScalarTransformer),
                Box::new(ReferenceTransformer),
                Box::new(ArrayTransformer),
                Box::new(DictionaryTransformer),
                Box::new(StreamTransformer),
            ],
        }
    }

    /// Dispatch to the first handler accepting `object`.
    pub fn apply(
        &self,
        object: Object,
        ctx: &mut TransformContext,
    ) -> Result<Object, PdfError> {
        for handler in &self.handlers {
            if handler.can_transform(&object) {
                return handler.transform(object, self, ctx);
            }
        }
        Ok(object)
    }

    /// Resolve and transform a dictionary entry, tolerating absence.
    pub fn apply_entry(
        &self,
        dict: &Dictionary,
        key: &str,
        ctx: &mut TransformContext,
    ) -> Result<Option<Object>, PdfError> {
        match dict.get(key) {
            Some(value) => Ok(Some(self.apply(value.clone(), ctx)?)),
            None => Ok(None),
        }
    }
}

/// Scalars pass through untouched.
struct ScalarTransformer;

impl Transform for ScalarTransformer {
    fn can_transform(&self, object: &Object) -> bool {
        matches!(
            object,
            Object::Null
                | Object::Boolean(_)
                | Object::Integer(_)
                | Object::Real(_)
                | Object::Name(_)
                | Object::String(_)
        )
    }

    fn transform(
        &self,
        object: Object,
        _pipeline: &TransformerPipeline,
        _ctx: &mut TransformContext,
    ) -> Result<Object, PdfError> {
        Ok(object)
    }
}

/// Resolves indirect references through the xref, memoizing per document.
struct ReferenceTransformer;

impl Transform for ReferenceTransformer {
    fn can_transform(&self, object: &Object) -> bool {
        matches!(object, Object::Reference(_))
    }

    fn transform(
        &self,
        object: Object,
        pipeline: &TransformerPipeline,
        ctx: &mut TransformContext,
    ) -> Result<Object, PdfError> {
        let reference = match object {
            Object::Reference(r) => r,
            _ => unreachable!(),
        };
        let key = (reference.object_number, reference.generation);
        if let Some(cached) = ctx.cache.get(&key) {
            return Ok(cached.clone());
        }
        if ctx.in_progress.contains(&key) {
            // resolution already running higher up the stack
            return Ok(Object::Null);
        }

        ctx.in_progress.insert(key);
        let raw = match ctx.xref.get(reference.object_number, ctx.parser) {
            Ok(Some(raw)) => raw,
            Ok(None) => Object::Null,
            Err(e) => {
                ctx.in_progress.remove(&key);
                // a broken object is skipped, not fatal for the document
                warn!(
                    "skipping unresolvable object {} {}: {}",
                    reference.object_number, reference.generation, e
                );
                ctx.cache.insert(key, Object::Null);
                return Ok(Object::Null);
            }
        };
        let transformed = pipeline.apply(raw, ctx);
        ctx.in_progress.remove(&key);
        let transformed = transformed?;
        ctx.cache.insert(key, transformed.clone());
        Ok(transformed)
    }
}

/// Transforms every element of an array.
struct ArrayTransformer;

impl Transform for ArrayTransformer {
    fn can_transform(&self, object: &Object) -> bool {
        matches!(object, Object::Array(_))
    }

    fn transform(
        &self,
        object: Object,
        pipeline: &TransformerPipeline,
        ctx: &mut TransformContext,
    ) -> Result<Object, PdfError> {
        let items = match object {
            Object::Array(a) => a,
            _ => unreachable!(),
        };
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(pipeline.apply(item, ctx)?);
        }
        Ok(Object::Array(out))
    }
}

/// Transforms every value of a dictionary.
struct DictionaryTransformer;

impl Transform for DictionaryTransformer {
    fn can_transform(&self, object: &Object) -> bool {
        matches!(object, Object::Dictionary(_))
    }

    fn transform(
        &self,
        object: Object,
        pipeline: &TransformerPipeline,
        ctx: &mut TransformContext,
    ) -> Result<Object, PdfError> {
        let dict = match object {
            Object::Dictionary(d) => d,
            _ => unreachable!(),
        };
        let mut out = Dictionary::new();
        for (key, value) in dict.iter() {
            out.set(key.clone(), pipeline.apply(value.clone(), ctx)?);
        }
        Ok(Object::Dictionary(out))
    }
}

/// Decodes the stream payload and transforms the stream dictionary.
struct StreamTransformer;

impl Transform for StreamTransformer {
    fn can_transform(&self, object: &Object) -> bool {
        matches!(object, Object::Stream(_))
    }

    fn transform(
        &self,
        object: Object,
        pipeline: &TransformerPipeline,
        ctx: &mut TransformContext,
    ) -> Result<Object, PdfError> {
        let mut stream = match object {
            Object::Stream(s) => s,
            _ => unreachable!(),
        };
        let mut dict = Dictionary::new();
        for (key, value) in stream.dict.iter() {
            dict.set(key.clone(), pipeline.apply(value.clone(), ctx)?);
        }
        stream.dict = dict;
        if let Err(e) = decode_stream(&mut stream) {
            warn!("stream left undecoded: {}", e);
        }
        Ok(Object::Stream(stream))
    }
}
