// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use playwebcam::constants::{self, element_names, factories};
use playwebcam::pipeline::StageRole;

#[test]
fn test_default_caps_are_raw_720p() {
    assert!(constants::DEFAULT_CAPS.starts_with("video/x-raw"));
    assert!(constants::DEFAULT_CAPS.contains("width=1280"));
    assert!(constants::DEFAULT_CAPS.contains("height=720"));
}

#[test]
fn test_element_names_are_distinct() {
    let names = [
        element_names::SOURCE,
        element_names::FILTER,
        element_names::CONVERTER,
        element_names::SINK,
    ];
    for (i, a) in names.iter().enumerate() {
        for b in &names[i + 1..] {
            assert_ne!(a, b, "Element names must be unique within the pipeline");
        }
    }
}

#[test]
fn test_filter_stage_is_capsfilter() {
    assert_eq!(factories::FILTER, "capsfilter");
}

#[test]
fn test_stage_role_display_names() {
    for role in StageRole::ALL {
        assert!(
            !role.display_name().is_empty(),
            "Role {:?} has empty display name",
            role
        );
    }
}
