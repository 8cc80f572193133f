// ---------------------------------------------------------------------------
// Binary model codec
// ---------------------------------------------------------------------------
//
// Trees are flattened pre-order into index-linked node lists, encoded with
// bitcode, optionally lz4-compressed, and wrapped with the RAIN header.
// Decoding accepts only that exact layout: every node is reached once, left
// child immediately after its parent, right child immediately after the left
// subtree. Decoding work is therefore linear in the node count.

use bitcode::{Decode, Encode};

use blending::analytics::{RaindropTree, RandomRainForest, TreeNode};

use crate::file_header::{unwrap_header, wrap_with_header, FLAG_COMPRESSED};
use crate::model_types::{ModelFile, ModelMetrics};
use crate::save_error::ModelFileError;

/// Schema version of `EncodedModel`.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Marks the absent children of a leaf.
const NO_CHILD: u32 = u32::MAX;

/// Deepest tree accepted on decode.
const MAX_DECODE_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode)]
struct EncodedNode {
    is_leaf: bool,
    /// Leaf value, or the split threshold of an internal node.
    value: f64,
    left: u32,
    right: u32,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
struct EncodedTree {
    max_depth: u32,
    /// Empty for an unfitted tree.
    nodes: Vec<EncodedNode>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
struct EncodedModel {
    format_version: u32,
    version: String,
    trained_at: u64,
    rmse: f64,
    samples: u64,
    trees: Vec<EncodedTree>,
}

fn to_u32(value: usize, what: &str) -> Result<u32, ModelFileError> {
    u32::try_from(value).map_err(|_| ModelFileError::Encode(format!("{what} {value} exceeds u32")))
}

fn flatten(node: &TreeNode, out: &mut Vec<EncodedNode>) -> Result<u32, ModelFileError> {
    let index = to_u32(out.len(), "node index")?;
    match node {
        TreeNode::Leaf { value } => out.push(EncodedNode {
            is_leaf: true,
            value: *value,
            left: NO_CHILD,
            right: NO_CHILD,
        }),
        TreeNode::Internal {
            threshold,
            left,
            right,
        } => {
            out.push(EncodedNode {
                is_leaf: false,
                value: *threshold,
                left: NO_CHILD,
                right: NO_CHILD,
            });
            let l = flatten(left, out)?;
            let r = flatten(right, out)?;
            let slot = &mut out[index as usize];
            slot.left = l;
            slot.right = r;
        }
    }
    Ok(index)
}

fn rebuild(
    nodes: &[EncodedNode],
    next: &mut usize,
    depth: usize,
) -> Result<TreeNode, ModelFileError> {
    if depth > MAX_DECODE_DEPTH {
        return Err(ModelFileError::Decode(format!(
            "tree deeper than {MAX_DECODE_DEPTH} levels"
        )));
    }
    let index = *next;
    let node = nodes.get(index).ok_or_else(|| {
        ModelFileError::Decode(format!("node link {index} out of range ({} nodes)", nodes.len()))
    })?;
    *next += 1;
    if node.is_leaf {
        return Ok(TreeNode::Leaf { value: node.value });
    }

    expect_link(index, "left", node.left, *next)?;
    let left = rebuild(nodes, next, depth + 1)?;
    expect_link(index, "right", node.right, *next)?;
    let right = rebuild(nodes, next, depth + 1)?;
    Ok(TreeNode::Internal {
        threshold: node.value,
        left: Box::new(left),
        right: Box::new(right),
    })
}

fn expect_link(
    index: usize,
    side: &str,
    link: u32,
    expected: usize,
) -> Result<(), ModelFileError> {
    if link as usize != expected {
        return Err(ModelFileError::Decode(format!(
            "node {index} {side} link is {link}, pre-order layout needs {expected}"
        )));
    }
    Ok(())
}

/// Rebuild a whole tree, rejecting nodes the walk never reaches.
fn rebuild_tree(nodes: &[EncodedNode]) -> Result<TreeNode, ModelFileError> {
    let mut next = 0;
    let root = rebuild(nodes, &mut next, 0)?;
    if next != nodes.len() {
        return Err(ModelFileError::Decode(format!(
            "{} of {} nodes unreachable from the root",
            nodes.len() - next,
            nodes.len()
        )));
    }
    Ok(root)
}

fn encode_tree(tree: &RaindropTree) -> Result<EncodedTree, ModelFileError> {
    let mut nodes = Vec::new();
    if let Some(root) = tree.root() {
        flatten(root, &mut nodes)?;
    }
    Ok(EncodedTree {
        max_depth: to_u32(tree.max_depth, "max depth")?,
        nodes,
    })
}

fn decode_tree(tree: &EncodedTree) -> Result<RaindropTree, ModelFileError> {
    let max_depth = tree.max_depth as usize;
    if tree.nodes.is_empty() {
        return Ok(RaindropTree::new(max_depth));
    }
    Ok(RaindropTree::from_root(max_depth, rebuild_tree(&tree.nodes)?))
}

/// Encode `model` into header-wrapped bytes, lz4-compressed when `compress`.
///
/// # Errors
///
/// `UntrainedForest` for an unfitted forest, `Encode` if the model is too
/// large for the header fields.
pub fn encode_model(model: &ModelFile, compress: bool) -> Result<Vec<u8>, ModelFileError> {
    if !model.forest.is_trained() {
        return Err(ModelFileError::UntrainedForest);
    }
    let trees = model
        .forest
        .trees()
        .iter()
        .map(encode_tree)
        .collect::<Result<Vec<_>, _>>()?;
    let encoded = EncodedModel {
        format_version: MODEL_FORMAT_VERSION,
        version: model.version.clone(),
        trained_at: model.trained_at,
        rmse: model.metrics.rmse,
        samples: model.metrics.samples,
        trees,
    };
    let raw = bitcode::encode(&encoded);
    let uncompressed_size = to_u32(raw.len(), "payload size")?;

    Ok(if compress {
        let packed = lz4_flex::compress_prepend_size(&raw);
        wrap_with_header(&packed, FLAG_COMPRESSED, uncompressed_size, model.trained_at)
    } else {
        wrap_with_header(&raw, 0, uncompressed_size, model.trained_at)
    })
}

/// Validate the header and decode a model.
///
/// # Errors
///
/// Any header error from `unwrap_header`; `Decode` for a bad payload or
/// malformed node links; `VersionMismatch` for a newer schema;
/// `UntrainedForest` if the file holds no trees.
pub fn decode_model(bytes: &[u8]) -> Result<ModelFile, ModelFileError> {
    let (header, payload) = unwrap_header(bytes)?;

    let unpacked;
    let raw: &[u8] = if header.is_compressed() {
        unpacked = lz4_flex::decompress_size_prepended(payload)
            .map_err(|e| ModelFileError::Decode(format!("lz4: {e}")))?;
        &unpacked
    } else {
        payload
    };
    if raw.len() != header.uncompressed_size as usize {
        return Err(ModelFileError::Decode(format!(
            "payload is {} bytes, header says {}",
            raw.len(),
            header.uncompressed_size
        )));
    }

    let encoded: EncodedModel = bitcode::decode(raw)?;
    if encoded.format_version > MODEL_FORMAT_VERSION {
        return Err(ModelFileError::VersionMismatch {
            expected_max: MODEL_FORMAT_VERSION,
            found: encoded.format_version,
        });
    }

    let trees = encoded
        .trees
        .iter()
        .map(decode_tree)
        .collect::<Result<Vec<_>, _>>()?;
    if trees.is_empty() {
        return Err(ModelFileError::UntrainedForest);
    }

    Ok(ModelFile {
        version: encoded.version,
        trained_at: encoded.trained_at,
        metrics: ModelMetrics {
            rmse: encoded.rmse,
            samples: encoded.samples,
        },
        forest: RandomRainForest::from_trees(trees),
    })
}
