/// Framebuffer formats (interned) and framebuffers
///
/// A framebuffer format is the structural description of a set of
/// attachments plus the passes that use them. Formats are canonicalised
/// before interning so that two descriptions differing only in irrelevant
/// details (non-attachment usage bits, order of input/preserve lists,
/// implicit single pass) map to the same handle.

use crate::device::{DataFormat, Handle, TextureSamples, TextureUsage};

/// Format of one attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentFormat {
    pub format: DataFormat,
    pub samples: TextureSamples,
    pub usage: TextureUsage,
}

impl AttachmentFormat {
    pub fn new(format: DataFormat, samples: TextureSamples, usage: TextureUsage) -> Self {
        Self { format, samples, usage }
    }

    /// Single-sampled color attachment
    pub fn color(format: DataFormat) -> Self {
        Self::new(format, TextureSamples::X1, TextureUsage::COLOR_ATTACHMENT)
    }

    /// Single-sampled depth/stencil attachment
    pub fn depth(format: DataFormat) -> Self {
        Self::new(format, TextureSamples::X1, TextureUsage::DEPTH_STENCIL_ATTACHMENT)
    }
}

/// Attachment usage of one subpass (indices into the attachment list)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FramebufferPass {
    pub color_attachments: Vec<u32>,
    pub input_attachments: Vec<u32>,
    /// Resolve targets, one per color attachment when present
    pub resolve_attachments: Vec<u32>,
    pub preserve_attachments: Vec<u32>,
    pub depth_attachment: Option<u32>,
}

impl FramebufferPass {
    /// Every attachment index the pass references
    pub fn referenced(&self) -> impl Iterator<Item = u32> + '_ {
        self.color_attachments
            .iter()
            .chain(&self.input_attachments)
            .chain(&self.resolve_attachments)
            .chain(&self.preserve_attachments)
            .copied()
            .chain(self.depth_attachment)
    }
}

/// Canonical, hashable framebuffer format description (the interning key)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FramebufferFormatKey {
    pub attachments: Vec<AttachmentFormat>,
    pub passes: Vec<FramebufferPass>,
    pub view_count: u32,
    /// Sample count of attachment-less formats
    pub empty_samples: Option<TextureSamples>,
}

impl FramebufferFormatKey {
    /// Build the canonical form
    ///
    /// # Arguments
    ///
    /// * `attachments` - Attachment formats, in binding order
    /// * `passes` - Subpasses; empty means one pass using every attachment
    /// * `view_count` - Multiview count
    pub fn canonical(attachments: &[AttachmentFormat], passes: &[FramebufferPass], view_count: u32) -> Self {
        let attachments: Vec<AttachmentFormat> = attachments
            .iter()
            .map(|a| AttachmentFormat {
                usage: a.usage & TextureUsage::ATTACHMENT_BITS,
                ..*a
            })
            .collect();

        let passes = if passes.is_empty() {
            vec![default_pass(&attachments)]
        } else {
            passes
                .iter()
                .map(|p| {
                    let mut pass = p.clone();
                    pass.input_attachments.sort_unstable();
                    pass.input_attachments.dedup();
                    pass.preserve_attachments.sort_unstable();
                    pass.preserve_attachments.dedup();
                    pass
                })
                .collect()
        };

        Self {
            attachments,
            passes,
            view_count,
            empty_samples: None,
        }
    }

    /// Canonical form of an attachment-less format
    pub fn empty(samples: TextureSamples) -> Self {
        Self {
            attachments: Vec::new(),
            passes: vec![FramebufferPass::default()],
            view_count: 1,
            empty_samples: Some(samples),
        }
    }
}

/// Single pass drawing into every color attachment and the first depth attachment
fn default_pass(attachments: &[AttachmentFormat]) -> FramebufferPass {
    let mut pass = FramebufferPass::default();
    for (index, attachment) in attachments.iter().enumerate() {
        if attachment.format.is_color() {
            pass.color_attachments.push(index as u32);
        } else if pass.depth_attachment.is_none() {
            pass.depth_attachment = Some(index as u32);
        }
    }
    pass
}

/// Registry payload for framebuffer formats
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FramebufferFormatRecord {
    pub key: FramebufferFormatKey,
}

impl FramebufferFormatRecord {
    pub fn pass_count(&self) -> u32 {
        self.key.passes.len() as u32
    }

    pub fn pass(&self, pass: u32) -> Option<&FramebufferPass> {
        self.key.passes.get(pass as usize)
    }

    /// Number of color attachments written by `pass`
    pub fn color_attachment_count(&self, pass: u32) -> usize {
        self.pass(pass).map_or(0, |p| p.color_attachments.len())
    }

    /// Sample count rendered by `pass`
    ///
    /// First color attachment, else the depth attachment, else the samples of
    /// an empty format.
    pub fn pass_samples(&self, pass: u32) -> Option<TextureSamples> {
        let pass = self.pass(pass)?;
        let attachment = pass
            .color_attachments
            .first()
            .copied()
            .or(pass.depth_attachment)
            .and_then(|index| self.key.attachments.get(index as usize));
        Some(match attachment {
            Some(attachment) => attachment.samples,
            None => self.key.empty_samples.unwrap_or(TextureSamples::X1),
        })
    }
}

/// Registry payload for framebuffers
#[derive(Debug, Clone)]
pub struct FramebufferRecord {
    pub format: Handle,
    /// Attachment textures in attachment order (empty for attachment-less framebuffers)
    pub textures: Vec<Handle>,
    pub width: u32,
    pub height: u32,
    pub view_count: u32,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "framebuffer_tests.rs"]
mod tests;
