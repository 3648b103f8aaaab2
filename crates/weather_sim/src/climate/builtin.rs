//! Built-in climate templates, one or more per latitude band.

use super::profile::{SeasonalTableSpec, SeasonalValue};
use super::template::{ClimateTemplate, TemplateLibrary, TemplateParameters};
use crate::region::{FactorValue, SpecialFactors};

/// (mean, variance) for winter, spring, summer, fall.
type Seasons = [(f32, f32); 4];

fn table(seasons: Seasons) -> SeasonalTableSpec {
    let [w, sp, su, f] = seasons.map(|(mean, variance)| SeasonalValue::new(mean, variance));
    SeasonalTableSpec::seasons(w, sp, su, f)
}

fn dew_table(seasons: Seasons, max: [f32; 4]) -> SeasonalTableSpec {
    let v = |i: usize| SeasonalValue::with_max(seasons[i].0, seasons[i].1, max[i]);
    SeasonalTableSpec::seasons(v(0), v(1), v(2), v(3))
}

fn factors(entries: &[(&str, FactorValue)]) -> SpecialFactors {
    let mut f = SpecialFactors::default();
    for (k, v) in entries {
        f.insert(*k, v.clone());
    }
    f
}

fn num(v: f32) -> FactorValue {
    FactorValue::Number(v)
}

fn text(v: &str) -> FactorValue {
    FactorValue::Text(v.to_string())
}

struct Preset {
    band: &'static str,
    id: &'static str,
    name: &'static str,
    description: &'static str,
    biome: &'static str,
    latitude: f32,
    elevation: f32,
    maritime: f32,
    roughness: f32,
    temperature: Seasons,
    humidity: Seasons,
    dew_point: Seasons,
    dew_max: [f32; 4],
    factors: Vec<(&'static str, FactorValue)>,
}

impl Preset {
    fn into_template(self) -> ClimateTemplate {
        ClimateTemplate {
            name: self.name.to_string(),
            description: self.description.to_string(),
            parameters: TemplateParameters {
                latitude: self.latitude,
                elevation: self.elevation,
                maritime_influence: self.maritime,
                terrain_roughness: self.roughness,
                special_factors: factors(&self.factors),
                temperature_profile: Some(table(self.temperature)),
                humidity_profile: Some(table(self.humidity)),
                dew_point_profile: Some(dew_table(self.dew_point, self.dew_max)),
            },
            default_biome: Some(self.biome.to_string()),
        }
    }
}

fn presets() -> Vec<Preset> {
    vec![
        Preset {
            band: "equatorial",
            id: "tropicalRainforest",
            name: "Tropical Rainforest",
            description: "Hot, saturated canopy with near-daily afternoon storms",
            biome: "tropical-rainforest",
            latitude: 3.0,
            elevation: 400.0,
            maritime: 0.6,
            roughness: 0.4,
            temperature: [(79.0, 4.0), (80.0, 4.0), (81.0, 4.0), (80.0, 4.0)],
            humidity: [(85.0, 6.0), (86.0, 6.0), (84.0, 6.0), (86.0, 6.0)],
            dew_point: [(73.0, 3.0), (74.0, 3.0), (75.0, 3.0), (74.0, 3.0)],
            dew_max: [80.0, 80.0, 80.0, 80.0],
            factors: vec![
                ("thunderstorms", num(0.7)),
                ("precipitationMultiplier", num(1.3)),
                ("forestDensity", num(0.95)),
                ("groundType", text("humus")),
            ],
        },
        Preset {
            band: "tropical",
            id: "savanna",
            name: "Savanna",
            description: "Warm grassland with a pronounced wet season",
            biome: "savanna",
            latitude: 12.0,
            elevation: 1200.0,
            maritime: 0.3,
            roughness: 0.2,
            temperature: [(75.0, 6.0), (82.0, 6.0), (80.0, 5.0), (78.0, 5.0)],
            humidity: [(45.0, 10.0), (55.0, 10.0), (75.0, 8.0), (65.0, 10.0)],
            dew_point: [(55.0, 5.0), (62.0, 5.0), (70.0, 4.0), (66.0, 4.0)],
            dew_max: [68.0, 72.0, 76.0, 74.0],
            factors: vec![
                ("thunderstorms", num(0.5)),
                ("forestDensity", num(0.3)),
                ("groundType", text("grassland")),
            ],
        },
        Preset {
            band: "arid",
            id: "hotDesert",
            name: "Hot Desert",
            description: "Scorching days, cold nights, rare rain",
            biome: "desert",
            latitude: 25.0,
            elevation: 1500.0,
            maritime: 0.05,
            roughness: 0.3,
            temperature: [(55.0, 7.0), (75.0, 7.0), (92.0, 6.0), (74.0, 7.0)],
            humidity: [(30.0, 8.0), (22.0, 8.0), (18.0, 6.0), (25.0, 8.0)],
            dew_point: [(28.0, 6.0), (30.0, 6.0), (38.0, 6.0), (32.0, 6.0)],
            dew_max: [50.0, 52.0, 60.0, 55.0],
            factors: vec![
                ("highDiurnalVariation", FactorValue::Bool(true)),
                ("precipitationMultiplier", num(0.5)),
                ("forestDensity", num(0.05)),
                ("groundType", text("sand")),
            ],
        },
        Preset {
            band: "temperate",
            id: "deciduousForest",
            name: "Deciduous Forest",
            description: "Four distinct seasons with snowy winters and humid summers",
            biome: "temperate-deciduous",
            latitude: 42.0,
            elevation: 600.0,
            maritime: 0.3,
            roughness: 0.4,
            temperature: [(32.0, 9.0), (52.0, 9.0), (72.0, 6.0), (54.0, 8.0)],
            humidity: [(72.0, 10.0), (65.0, 10.0), (68.0, 10.0), (72.0, 10.0)],
            dew_point: [(22.0, 6.0), (38.0, 6.0), (60.0, 5.0), (42.0, 6.0)],
            dew_max: [45.0, 62.0, 74.0, 65.0],
            factors: vec![
                ("thunderstorms", num(0.4)),
                ("forestDensity", num(0.7)),
                ("groundType", text("loam")),
            ],
        },
        Preset {
            band: "temperate",
            id: "mediterraneanCoast",
            name: "Mediterranean Coast",
            description: "Mild wet winters and long dry summers",
            biome: "chaparral",
            latitude: 38.0,
            elevation: 200.0,
            maritime: 0.8,
            roughness: 0.5,
            temperature: [(50.0, 6.0), (60.0, 6.0), (76.0, 5.0), (64.0, 6.0)],
            humidity: [(70.0, 8.0), (62.0, 8.0), (50.0, 8.0), (64.0, 8.0)],
            dew_point: [(40.0, 5.0), (46.0, 5.0), (56.0, 5.0), (50.0, 5.0)],
            dew_max: [55.0, 60.0, 68.0, 64.0],
            factors: vec![
                ("forestDensity", num(0.45)),
                ("groundType", text("rocky")),
            ],
        },
        Preset {
            band: "temperate",
            id: "maritimeCoast",
            name: "Maritime Coast",
            description: "Cool, cloudy and damp in every season",
            biome: "temperate-rainforest",
            latitude: 50.0,
            elevation: 100.0,
            maritime: 0.9,
            roughness: 0.3,
            temperature: [(42.0, 5.0), (50.0, 5.0), (62.0, 4.0), (52.0, 5.0)],
            humidity: [(84.0, 6.0), (77.0, 8.0), (74.0, 8.0), (82.0, 6.0)],
            dew_point: [(36.0, 4.0), (42.0, 4.0), (53.0, 4.0), (46.0, 4.0)],
            dew_max: [46.0, 52.0, 62.0, 56.0],
            factors: vec![
                ("highWinds", FactorValue::Bool(true)),
                ("forestDensity", num(0.8)),
                ("groundType", text("loam")),
            ],
        },
        Preset {
            band: "continental",
            id: "continentalSteppe",
            name: "Continental Steppe",
            description: "Bitter winters, hot summers, violent spring storms",
            biome: "steppe",
            latitude: 48.0,
            elevation: 1800.0,
            maritime: 0.1,
            roughness: 0.2,
            temperature: [(20.0, 10.0), (46.0, 10.0), (73.0, 7.0), (47.0, 9.0)],
            humidity: [(72.0, 8.0), (58.0, 10.0), (58.0, 10.0), (64.0, 10.0)],
            dew_point: [(10.0, 6.0), (30.0, 6.0), (55.0, 5.0), (34.0, 6.0)],
            dew_max: [32.0, 55.0, 72.0, 60.0],
            factors: vec![
                ("thunderstorms", num(0.5)),
                ("highWinds", FactorValue::Bool(true)),
                ("forestDensity", num(0.15)),
                ("groundType", text("grassland")),
            ],
        },
        Preset {
            band: "subarctic",
            id: "borealForest",
            name: "Boreal Forest",
            description: "Long snowbound winters under dense conifers",
            biome: "taiga",
            latitude: 60.0,
            elevation: 900.0,
            maritime: 0.2,
            roughness: 0.4,
            temperature: [(5.0, 10.0), (32.0, 9.0), (62.0, 7.0), (34.0, 8.0)],
            humidity: [(76.0, 8.0), (65.0, 8.0), (68.0, 8.0), (76.0, 8.0)],
            dew_point: [(-2.0, 6.0), (22.0, 6.0), (50.0, 5.0), (26.0, 6.0)],
            dew_max: [20.0, 40.0, 64.0, 45.0],
            factors: vec![
                ("forestDensity", num(0.85)),
                ("groundType", text("podzol")),
            ],
        },
        Preset {
            band: "polar",
            id: "tundra",
            name: "Tundra",
            description: "Treeless permafrost plains with a brief thaw",
            biome: "tundra",
            latitude: 70.0,
            elevation: 300.0,
            maritime: 0.4,
            roughness: 0.2,
            temperature: [(-15.0, 9.0), (8.0, 9.0), (44.0, 6.0), (18.0, 8.0)],
            humidity: [(74.0, 8.0), (74.0, 8.0), (78.0, 8.0), (80.0, 8.0)],
            dew_point: [(-22.0, 5.0), (-2.0, 5.0), (36.0, 4.0), (10.0, 5.0)],
            dew_max: [0.0, 20.0, 46.0, 30.0],
            factors: vec![
                ("highWinds", FactorValue::Bool(true)),
                ("forestDensity", num(0.05)),
                ("groundType", text("permafrost")),
            ],
        },
        Preset {
            band: "polar",
            id: "iceCap",
            name: "Ice Cap",
            description: "Permanent glacial ice; summer barely reaches freezing",
            biome: "ice-sheet",
            latitude: 78.0,
            elevation: 6000.0,
            maritime: 0.1,
            roughness: 0.1,
            temperature: [(-30.0, 9.0), (-14.0, 9.0), (22.0, 6.0), (-8.0, 8.0)],
            humidity: [(70.0, 8.0), (70.0, 8.0), (75.0, 8.0), (72.0, 8.0)],
            dew_point: [(-38.0, 5.0), (-24.0, 5.0), (14.0, 4.0), (-18.0, 5.0)],
            dew_max: [-15.0, 0.0, 28.0, 5.0],
            factors: vec![
                ("highWinds", FactorValue::Bool(true)),
                ("groundType", text("glacier")),
            ],
        },
    ]
}

impl TemplateLibrary {
    pub fn builtin() -> Self {
        let mut library = TemplateLibrary::default();
        for preset in presets() {
            let (band, id) = (preset.band, preset.id);
            library.insert(band, id, preset.into_template());
        }
        library
    }
}
