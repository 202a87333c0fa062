//! Discovery of the NAT machine image booted by the base stack.

use thiserror::Error;
use tracing::debug;

use crate::provider::{CloudProvider, ImageFilter, ImageSummary, ProviderError};

/// Owner alias publishing the NAT images.
pub const NAT_IMAGE_OWNER: &str = "amazon";
/// Name glob matching the VPC NAT images.
pub const NAT_IMAGE_NAME_PATTERN: &str = "amzn-ami-vpc-nat-hvm*";
/// Architecture a candidate must report.
pub const REQUIRED_ARCHITECTURE: &str = "x86_64";
/// Root volume type a candidate must report.
pub const REQUIRED_VOLUME_TYPE: &str = "standard";

/// Errors raised while choosing the NAT image.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ImageError {
    /// Raised when no candidate survives filtering.
    #[error("no AMIs found with correct specs")]
    NoMatchingImage,
    /// Provider failure passed through unchanged.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Filter sent to the provider when listing NAT image candidates.
#[must_use]
pub fn nat_image_filter() -> ImageFilter {
    ImageFilter {
        owner: NAT_IMAGE_OWNER.to_owned(),
        name_pattern: NAT_IMAGE_NAME_PATTERN.to_owned(),
    }
}

/// Picks the newest x86-64 image with a standard root volume.
///
/// Creation dates are ISO-8601 strings and compare lexicographically.
#[must_use]
pub fn select_latest(images: &[ImageSummary]) -> Option<&ImageSummary> {
    images
        .iter()
        .filter(|image| image.architecture == REQUIRED_ARCHITECTURE)
        .filter(|image| image.root_volume_type.as_deref() == Some(REQUIRED_VOLUME_TYPE))
        .max_by(|left, right| left.creation_date.cmp(&right.creation_date))
}

/// Lists NAT image candidates and returns the id of the newest match.
///
/// # Errors
///
/// Returns [`ImageError::NoMatchingImage`] when nothing matches and
/// [`ImageError::Provider`] when the listing fails.
pub async fn latest_nat_image<P>(provider: &P) -> Result<String, ImageError>
where
    P: CloudProvider + ?Sized,
{
    let filter = nat_image_filter();
    let candidates = provider.describe_images(&filter).await?;
    let chosen = select_latest(&candidates).ok_or(ImageError::NoMatchingImage)?;
    debug!(
        image = %chosen.image_id,
        created = %chosen.creation_date,
        candidates = candidates.len(),
        "selected NAT image"
    );
    Ok(chosen.image_id.clone())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn image(id: &str, architecture: &str, volume: Option<&str>, created: &str) -> ImageSummary {
        ImageSummary {
            image_id: id.to_owned(),
            architecture: architecture.to_owned(),
            root_volume_type: volume.map(str::to_owned),
            creation_date: created.to_owned(),
        }
    }

    #[rstest]
    fn picks_newest_matching_image() {
        let images = vec![
            image("ami-old", "x86_64", Some("standard"), "2015-03-01T00:00:00.000Z"),
            image("ami-new", "x86_64", Some("standard"), "2016-01-20T00:00:00.000Z"),
            image("ami-mid", "x86_64", Some("standard"), "2015-09-01T00:00:00.000Z"),
        ];
        let chosen = select_latest(&images).map(|found| found.image_id.as_str());
        assert_eq!(chosen, Some("ami-new"));
    }

    #[rstest]
    fn skips_images_with_wrong_architecture_or_volume() {
        let images = vec![
            image("ami-arm", "arm64", Some("standard"), "2017-01-01T00:00:00.000Z"),
            image("ami-gp2", "x86_64", Some("gp2"), "2017-01-01T00:00:00.000Z"),
            image("ami-instance", "x86_64", None, "2017-01-01T00:00:00.000Z"),
            image("ami-ok", "x86_64", Some("standard"), "2014-01-01T00:00:00.000Z"),
        ];
        let chosen = select_latest(&images).map(|found| found.image_id.as_str());
        assert_eq!(chosen, Some("ami-ok"));
    }

    #[rstest]
    fn returns_none_without_survivors() {
        let images = vec![image("ami-arm", "i386", Some("standard"), "2017-01-01")];
        assert!(select_latest(&images).is_none());
        assert!(select_latest(&[]).is_none());
    }

    #[rstest]
    fn filter_targets_amazon_nat_images() {
        let filter = nat_image_filter();
        assert_eq!(filter.owner, "amazon");
        assert_eq!(filter.name_pattern, "amzn-ami-vpc-nat-hvm*");
    }
}
