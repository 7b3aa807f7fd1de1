//! Unit tests for framebuffer.rs (canonicalisation rules)

use crate::device::{
    AttachmentFormat, DataFormat, FramebufferFormatKey, FramebufferFormatRecord, FramebufferPass,
    TextureSamples, TextureUsage,
};

fn color_depth() -> Vec<AttachmentFormat> {
    vec![
        AttachmentFormat::color(DataFormat::R8G8B8A8_UNORM),
        AttachmentFormat::depth(DataFormat::D32_SFLOAT),
    ]
}

#[test]
fn test_usage_bits_outside_attachments_are_ignored() {
    let mut noisy = color_depth();
    noisy[0].usage |= TextureUsage::SAMPLING | TextureUsage::CAN_COPY_FROM;

    let a = FramebufferFormatKey::canonical(&color_depth(), &[], 1);
    let b = FramebufferFormatKey::canonical(&noisy, &[], 1);
    assert_eq!(a, b);
}

#[test]
fn test_implicit_pass_equals_explicit_default_pass() {
    let explicit = FramebufferPass {
        color_attachments: vec![0],
        depth_attachment: Some(1),
        ..Default::default()
    };

    let a = FramebufferFormatKey::canonical(&color_depth(), &[], 1);
    let b = FramebufferFormatKey::canonical(&color_depth(), &[explicit], 1);
    assert_eq!(a, b);
    assert_eq!(a.passes.len(), 1);
}

#[test]
fn test_input_and_preserve_order_is_irrelevant() {
    let attachments = vec![
        AttachmentFormat::color(DataFormat::R8G8B8A8_UNORM),
        AttachmentFormat::color(DataFormat::R16G16B16A16_SFLOAT),
        AttachmentFormat::color(DataFormat::R32_SFLOAT),
    ];
    let first = FramebufferPass {
        color_attachments: vec![2],
        input_attachments: vec![1, 0],
        preserve_attachments: vec![1, 0, 1],
        ..Default::default()
    };
    let second = FramebufferPass {
        color_attachments: vec![2],
        input_attachments: vec![0, 1],
        preserve_attachments: vec![0, 1],
        ..Default::default()
    };

    assert_eq!(
        FramebufferFormatKey::canonical(&attachments, &[first], 1),
        FramebufferFormatKey::canonical(&attachments, &[second], 1),
    );
}

#[test]
fn test_color_order_is_significant() {
    let swapped = FramebufferPass {
        color_attachments: vec![1, 0],
        ..Default::default()
    };
    let attachments = vec![
        AttachmentFormat::color(DataFormat::R8G8B8A8_UNORM),
        AttachmentFormat::color(DataFormat::R32_SFLOAT),
    ];
    assert_ne!(
        FramebufferFormatKey::canonical(&attachments, &[], 1),
        FramebufferFormatKey::canonical(&attachments, &[swapped], 1),
    );
}

#[test]
fn test_view_count_is_significant() {
    assert_ne!(
        FramebufferFormatKey::canonical(&color_depth(), &[], 1),
        FramebufferFormatKey::canonical(&color_depth(), &[], 2),
    );
}

#[test]
fn test_pass_samples() {
    let attachments = vec![
        AttachmentFormat::new(DataFormat::R8G8B8A8_UNORM, TextureSamples::X4, TextureUsage::COLOR_ATTACHMENT),
        AttachmentFormat::new(DataFormat::D32_SFLOAT, TextureSamples::X4, TextureUsage::DEPTH_STENCIL_ATTACHMENT),
    ];
    let depth_only = FramebufferPass {
        depth_attachment: Some(1),
        ..Default::default()
    };
    let record = FramebufferFormatRecord {
        key: FramebufferFormatKey::canonical(&attachments, &[FramebufferPass::default(), depth_only], 1),
    };

    assert_eq!(record.pass_count(), 2);
    assert_eq!(record.pass_samples(0), Some(TextureSamples::X1));
    assert_eq!(record.pass_samples(1), Some(TextureSamples::X4));
    assert_eq!(record.pass_samples(2), None);
    assert_eq!(record.color_attachment_count(0), 0);
}

#[test]
fn test_empty_format_samples() {
    let record = FramebufferFormatRecord {
        key: FramebufferFormatKey::empty(TextureSamples::X8),
    };
    assert_eq!(record.pass_count(), 1);
    assert_eq!(record.pass_samples(0), Some(TextureSamples::X8));
    assert_ne!(FramebufferFormatKey::empty(TextureSamples::X8), FramebufferFormatKey::empty(TextureSamples::X1));
}
