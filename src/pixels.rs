use serde::Deserialize;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const OFF: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Rgb {
        Rgb { r, g, b }
    }

    /// Builds a pixel from channel intensities, saturating into `0..=255`.
    pub fn from_channels(r: f64, g: f64, b: f64) -> Rgb {
        Rgb {
            r: to_channel(r),
            g: to_channel(g),
            b: to_channel(b),
        }
    }

    pub fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Rgb { r, g, b }
    }
}

fn to_channel(value: f64) -> u8 {
    // `as` saturates and maps NaN to zero
    value as u8
}

/// Contiguous run of pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Zone {
    pub offset: usize,
    pub count: usize,
}

impl Zone {
    pub const fn new(offset: usize, count: usize) -> Zone {
        Zone { offset, count }
    }

    pub const fn end(self) -> usize {
        self.offset.saturating_add(self.count)
    }

    fn overlaps(self, other: Zone) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }
}

/// Selects a ring. `0` is the innermost ring; negative values count back from
/// the outermost, so `-1` is always the outer edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RingIndex(pub i32);

impl RingIndex {
    pub const INNER: RingIndex = RingIndex(0);
    pub const OUTER: RingIndex = RingIndex(-1);
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("zone {name} ({offset}..{end}) does not fit in {total} pixels")]
    OutOfBounds {
        name: String,
        offset: usize,
        end: usize,
        total: usize,
    },
    #[error("zones {0} and {1} overlap")]
    Overlap(String, String),
    #[error("ring {index} does not exist, there are {rings} rings")]
    NoSuchRing { index: i32, rings: usize },
}

/// Where the rings and the cabinet strip live in the pixel buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneLayout {
    total: usize,
    rings: Vec<Zone>,
    cabinet: Zone,
}

impl ZoneLayout {
    /// Rings are laid out back to back from `ring_start`, innermost first.
    pub fn new(
        total: usize,
        ring_start: usize,
        ring_sizes: &[usize],
        cabinet_start: usize,
        cabinet_count: usize,
    ) -> Result<ZoneLayout, LayoutError> {
        let mut rings = Vec::with_capacity(ring_sizes.len());
        let mut offset = ring_start;
        for (i, &count) in ring_sizes.iter().enumerate() {
            rings.push(Zone::new(offset, count));
            offset = offset
                .checked_add(count)
                .ok_or_else(|| LayoutError::OutOfBounds {
                    name: format!("ring {i}"),
                    offset,
                    end: usize::MAX,
                    total,
                })?;
        }

        let layout = ZoneLayout {
            total,
            rings,
            cabinet: Zone::new(cabinet_start, cabinet_count),
        };
        layout.validate()?;

        Ok(layout)
    }

    fn named_zones(&self) -> Vec<(String, Zone)> {
        let mut zones: Vec<(String, Zone)> = self
            .rings
            .iter()
            .enumerate()
            .map(|(i, zone)| (format!("ring {i}"), *zone))
            .collect();
        zones.push((String::from("cabinet"), self.cabinet));
        zones
    }

    fn validate(&self) -> Result<(), LayoutError> {
        let zones = self.named_zones();

        for (name, zone) in &zones {
            match zone.offset.checked_add(zone.count) {
                Some(end) if end <= self.total => {}
                end => {
                    return Err(LayoutError::OutOfBounds {
                        name: name.clone(),
                        offset: zone.offset,
                        end: end.unwrap_or(usize::MAX),
                        total: self.total,
                    })
                }
            }
        }

        for (i, (a_name, a)) in zones.iter().enumerate() {
            for (b_name, b) in &zones[i + 1..] {
                if a.count > 0 && b.count > 0 && a.overlaps(*b) {
                    return Err(LayoutError::Overlap(a_name.clone(), b_name.clone()));
                }
            }
        }

        Ok(())
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }

    pub fn ring(&self, index: RingIndex) -> Result<Zone, LayoutError> {
        let rings = self.rings.len() as i32;
        let resolved = if index.0 < 0 { rings + index.0 } else { index.0 };

        if resolved < 0 || resolved >= rings {
            return Err(LayoutError::NoSuchRing {
                index: index.0,
                rings: self.rings.len(),
            });
        }

        Ok(self.rings[resolved as usize])
    }

    /// The span covering every ring.
    pub fn all_rings(&self) -> Zone {
        match (self.rings.first(), self.rings.last()) {
            (Some(first), Some(last)) => Zone::new(first.offset, last.end() - first.offset),
            _ => Zone::new(0, 0),
        }
    }

    pub fn cabinet(&self) -> Zone {
        self.cabinet
    }
}

/// The frame handed to the sink: one color per addressable pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    pixels: Vec<Rgb>,
}

impl PixelBuffer {
    pub fn new(len: usize) -> PixelBuffer {
        PixelBuffer {
            pixels: vec![Rgb::OFF; len],
        }
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    #[cfg(test)]
    pub fn zone(&self, zone: Zone) -> &[Rgb] {
        &self.pixels[zone.offset..zone.end()]
    }

    pub fn zone_mut(&mut self, zone: Zone) -> &mut [Rgb] {
        &mut self.pixels[zone.offset..zone.end()]
    }

    pub fn fill(&mut self, zone: Zone, color: Rgb) {
        self.zone_mut(zone).fill(color);
    }

    pub fn get(&self, index: usize) -> Rgb {
        self.pixels[index]
    }

    pub fn set(&mut self, index: usize, color: Rgb) {
        self.pixels[index] = color;
    }

    /// Overwrites this frame with `other` without reallocating.
    pub fn copy_from(&mut self, other: &PixelBuffer) {
        self.pixels.copy_from_slice(&other.pixels);
    }
}
