/// 8-point compass rose, each label covering a 45° arc centered on it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CompassPoint {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

const POINTS: [CompassPoint; 8] = [
    CompassPoint::N,
    CompassPoint::NE,
    CompassPoint::E,
    CompassPoint::SE,
    CompassPoint::S,
    CompassPoint::SW,
    CompassPoint::W,
    CompassPoint::NW,
];

impl CompassPoint {
    /// Maps a bearing in degrees to its label. Exact boundaries round half up, so 22.5° is NE
    /// and 337.5° wraps around to N.
    pub fn from_bearing(bearing_deg: f64) -> Self {
        let index = (bearing_deg.rem_euclid(360.0) / 45.0).round() as usize;
        POINTS[index % POINTS.len()]
    }

    pub fn name(&self) -> &str {
        match self {
            CompassPoint::N => "north",
            CompassPoint::NE => "northeast",
            CompassPoint::E => "east",
            CompassPoint::SE => "southeast",
            CompassPoint::S => "south",
            CompassPoint::SW => "southwest",
            CompassPoint::W => "west",
            CompassPoint::NW => "northwest",
        }
    }

    pub fn abbreviation(&self) -> &str {
        match self {
            CompassPoint::N => "N",
            CompassPoint::NE => "NE",
            CompassPoint::E => "E",
            CompassPoint::SE => "SE",
            CompassPoint::S => "S",
            CompassPoint::SW => "SW",
            CompassPoint::W => "W",
            CompassPoint::NW => "NW",
        }
    }
}

impl std::fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}
