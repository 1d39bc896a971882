//! Pixel format negotiation shared by the backends.
//!
//! Every os has a "choose the best match" call (`ChoosePixelFormat`, `glXChooseFBConfig`,
//! `glXChooseVisual`, `NSOpenGLPixelFormat initWithAttributes:`) and a way to list everything it
//! has. the best match is not trusted blindly. if it does not meet the [`PixelFormatRequirement`],
//! the full list is scanned and the first format that does wins.

/// What a window surface needs at minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormatRequirement {
    pub double_buffer: bool,
    pub rgba: bool,
    /// red + green + blue bits
    pub min_color_bits: u8,
    pub min_depth_bits: u8,
    pub min_stencil_bits: u8,
}

impl Default for PixelFormatRequirement {
    fn default() -> Self {
        Self {
            double_buffer: true,
            rgba: true,
            min_color_bits: 24,
            min_depth_bits: 0,
            min_stencil_bits: 0,
        }
    }
}

/// The attributes of one native pixel format, as reported by the os.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelFormatInfo {
    pub double_buffer: bool,
    pub rgba: bool,
    pub color_bits: u8,
    pub alpha_bits: u8,
    pub depth_bits: u8,
    pub stencil_bits: u8,
}

impl PixelFormatRequirement {
    pub fn accepts(&self, info: &PixelFormatInfo) -> bool {
        (!self.double_buffer || info.double_buffer)
            && (!self.rgba || info.rgba)
            && info.color_bits >= self.min_color_bits
            && info.depth_bits >= self.min_depth_bits
            && info.stencil_bits >= self.min_stencil_bits
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PixelFormatError {
    #[error("none of the {examined} available pixel formats meets {requirement:?}")]
    NoneSatisfies {
        requirement: PixelFormatRequirement,
        examined: usize,
    },
}

/// Picks a format meeting `requirement`. `best` is the os best match (if the call found anything),
/// and `candidates` is the full list. it is only walked when the best match is missing or rejected.
pub fn negotiate<T, I, C>(
    requirement: &PixelFormatRequirement,
    best: Option<(T, PixelFormatInfo)>,
    candidates: C,
) -> Result<(T, PixelFormatInfo), PixelFormatError>
where
    I: IntoIterator<Item = (T, PixelFormatInfo)>,
    C: FnOnce() -> I,
{
    if let Some((format, info)) = best {
        if requirement.accepts(&info) {
            tracing::debug!(?info, "using best matching pixel format");
            return Ok((format, info));
        }
        tracing::warn!(?info, ?requirement, "best matching pixel format rejected, enumerating");
    }
    let mut examined = 0;
    for (format, info) in candidates() {
        examined += 1;
        if requirement.accepts(&info) {
            tracing::debug!(?info, examined, "using enumerated pixel format");
            return Ok((format, info));
        }
    }
    Err(PixelFormatError::NoneSatisfies {
        requirement: *requirement,
        examined,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: PixelFormatInfo = PixelFormatInfo {
        double_buffer: true,
        rgba: true,
        color_bits: 24,
        alpha_bits: 8,
        depth_bits: 24,
        stencil_bits: 8,
    };
    const SINGLE_BUFFERED: PixelFormatInfo = PixelFormatInfo {
        double_buffer: false,
        ..GOOD
    };
    const HIGH_COLOR: PixelFormatInfo = PixelFormatInfo {
        color_bits: 16,
        ..GOOD
    };
    const INDEXED: PixelFormatInfo = PixelFormatInfo { rgba: false, ..GOOD };

    #[test]
    fn good_best_match_skips_enumeration() {
        let picked = negotiate(
            &PixelFormatRequirement::default(),
            Some((7, GOOD)),
            || -> Vec<(i32, PixelFormatInfo)> { unreachable!("enumeration not needed") },
        )
        .unwrap();
        assert_eq!(picked, (7, GOOD));
    }

    #[test]
    fn rejected_best_match_falls_back_to_first_acceptable() {
        let formats = vec![(1, SINGLE_BUFFERED), (2, HIGH_COLOR), (3, GOOD), (4, GOOD)];
        let picked = negotiate(
            &PixelFormatRequirement::default(),
            Some((1, SINGLE_BUFFERED)),
            || formats,
        )
        .unwrap();
        assert_eq!(picked.0, 3);
    }

    #[test]
    fn missing_best_match_enumerates() {
        let picked = negotiate(&PixelFormatRequirement::default(), None, || {
            [(9, INDEXED), (10, GOOD)]
        })
        .unwrap();
        assert_eq!(picked.0, 10);
    }

    #[test]
    fn nothing_acceptable_fails_cleanly() {
        let err = negotiate(
            &PixelFormatRequirement::default(),
            Some((1, HIGH_COLOR)),
            || [(1, HIGH_COLOR), (2, SINGLE_BUFFERED), (3, INDEXED)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            PixelFormatError::NoneSatisfies {
                requirement: PixelFormatRequirement::default(),
                examined: 3
            }
        );
        let err = negotiate::<u32, Vec<_>, _>(&PixelFormatRequirement::default(), None, Vec::new)
            .unwrap_err();
        assert!(matches!(err, PixelFormatError::NoneSatisfies { examined: 0, .. }));
    }

    #[test]
    fn extra_requirements() {
        let requirement = PixelFormatRequirement {
            min_depth_bits: 24,
            min_stencil_bits: 8,
            ..Default::default()
        };
        let no_stencil = PixelFormatInfo { stencil_bits: 0, ..GOOD };
        assert!(!requirement.accepts(&no_stencil));
        assert!(requirement.accepts(&GOOD));
        // the default requirement does not care about depth
        let no_depth = PixelFormatInfo { depth_bits: 0, ..GOOD };
        assert!(PixelFormatRequirement::default().accepts(&no_depth));
    }
}
