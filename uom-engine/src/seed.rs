//! Built-in catalog - trade units for a textile business, organized by category

use uom_core::{CatalogFeed, Unit, UnitCategory, UnitType};

pub const WEIGHT: u64 = 1;
pub const LENGTH: u64 = 2;
pub const FABRIC_WEIGHT: u64 = 3;
pub const LINEAR_DENSITY: u64 = 4;
pub const QUANTITY: u64 = 5;

/// The default catalog served when no external source is configured
pub fn seed_feed() -> CatalogFeed {
    let categories = vec![
        UnitCategory::new(WEIGHT, "Weight"),
        UnitCategory::new(LENGTH, "Length"),
        UnitCategory::new(FABRIC_WEIGHT, "Textile - Fabric Weight"),
        UnitCategory::new(LINEAR_DENSITY, "Textile - Linear Density"),
        UnitCategory::new(QUANTITY, "Quantity"),
    ];

    let mut units = Vec::new();
    weight_units(&mut units);
    length_units(&mut units);
    fabric_weight_units(&mut units);
    linear_density_units(&mut units);
    quantity_units(&mut units);

    CatalogFeed::new(categories, units)
}

fn weight_units(units: &mut Vec<Unit>) {
    // SI
    units.push(Unit::new(1, WEIGHT, "Kilogram", "kg", 1.0).base()
        .with_type(UnitType::Si).with_alternates(&["kilo", "kgs"]).with_decimals(3).with_sort_order(1));
    units.push(Unit::new(2, WEIGHT, "Gram", "g", 0.001)
        .with_type(UnitType::Si).with_alternates(&["gm", "grams"]).with_decimals(2).with_sort_order(2));
    units.push(Unit::new(3, WEIGHT, "Milligram", "mg", 0.000001)
        .with_type(UnitType::Si).with_decimals(0).with_sort_order(3));

    // International
    units.push(Unit::new(4, WEIGHT, "Metric Ton", "t", 1000.0)
        .with_type(UnitType::International).with_alternates(&["tonne", "MT"]).with_decimals(4).with_sort_order(4));

    // English
    units.push(Unit::new(5, WEIGHT, "Pound", "lb", 0.45359237)
        .with_type(UnitType::English).with_alternates(&["lbs", "pounds"]).with_decimals(3).with_sort_order(5));
    units.push(Unit::new(6, WEIGHT, "Ounce", "oz", 0.028349523125)
        .with_type(UnitType::English).with_alternates(&["ounces"]).with_decimals(2).with_sort_order(6));

    // Desi
    units.push(Unit::new(7, WEIGHT, "Tola", "tola", 0.0116638125)
        .with_type(UnitType::Desi).in_region("South Asia").with_decimals(2).with_sort_order(7)
        .with_description("Traditional bullion and spice weight, 180 grains troy"));
    units.push(Unit::new(8, WEIGHT, "Seer", "seer", 0.933105)
        .with_type(UnitType::Desi).in_region("South Asia").with_alternates(&["ser"]).with_decimals(3).with_sort_order(8));
    units.push(Unit::new(9, WEIGHT, "Maund", "maund", 37.3242)
        .with_type(UnitType::Desi).in_region("South Asia").with_alternates(&["mann", "mun"]).with_decimals(3).with_sort_order(9));
}

fn length_units(units: &mut Vec<Unit>) {
    units.push(Unit::new(10, LENGTH, "Meter", "m", 1.0).base()
        .with_type(UnitType::Si).with_alternates(&["metre", "mtr"]).with_decimals(2).with_sort_order(1));
    units.push(Unit::new(11, LENGTH, "Centimeter", "cm", 0.01)
        .with_type(UnitType::Si).with_alternates(&["centimetre"]).with_decimals(1).with_sort_order(2));
    units.push(Unit::new(12, LENGTH, "Millimeter", "mm", 0.001)
        .with_type(UnitType::Si).with_alternates(&["millimetre"]).with_decimals(0).with_sort_order(3));
    units.push(Unit::new(13, LENGTH, "Kilometer", "km", 1000.0)
        .with_type(UnitType::Si).with_alternates(&["kilometre"]).with_decimals(3).with_sort_order(4));

    units.push(Unit::new(14, LENGTH, "Inch", "in", 0.0254)
        .with_type(UnitType::English).with_alternates(&["inches"]).with_decimals(2).with_sort_order(5));
    units.push(Unit::new(15, LENGTH, "Foot", "ft", 0.3048)
        .with_type(UnitType::English).with_alternates(&["feet"]).with_decimals(2).with_sort_order(6));
    units.push(Unit::new(16, LENGTH, "Yard", "yd", 0.9144)
        .with_type(UnitType::English).with_alternates(&["yards"]).with_decimals(2).with_sort_order(7));

    units.push(Unit::new(17, LENGTH, "Gaz", "gaz", 0.9144)
        .with_type(UnitType::Desi).in_region("South Asia").with_alternates(&["guz"]).with_decimals(2).with_sort_order(8));
}

fn fabric_weight_units(units: &mut Vec<Unit>) {
    units.push(Unit::new(20, FABRIC_WEIGHT, "Grams per Square Meter", "GSM", 1.0).base()
        .with_type(UnitType::Textile).with_alternates(&["g/m2", "g/m²"]).with_decimals(0).with_sort_order(1));
    units.push(Unit::new(21, FABRIC_WEIGHT, "Ounces per Square Yard", "oz/yd²", 33.905747)
        .with_type(UnitType::English).with_alternates(&["osy", "oz/yd2"]).with_decimals(2).with_sort_order(2));
}

fn linear_density_units(units: &mut Vec<Unit>) {
    // Tex = grams per 1000 m of yarn
    units.push(Unit::new(30, LINEAR_DENSITY, "Tex", "tex", 1.0).base()
        .with_type(UnitType::Textile).with_decimals(2).with_sort_order(1));
    units.push(Unit::new(31, LINEAR_DENSITY, "Decitex", "dtex", 0.1)
        .with_type(UnitType::Textile).with_decimals(1).with_sort_order(2));
    units.push(Unit::new(32, LINEAR_DENSITY, "Denier", "den", 1.0 / 9.0)
        .with_type(UnitType::Textile).with_alternates(&["denier", "td"]).with_decimals(1).with_sort_order(3));
}

fn quantity_units(units: &mut Vec<Unit>) {
    units.push(Unit::new(40, QUANTITY, "Piece", "pc", 1.0).base()
        .with_alternates(&["pcs", "nos"]).with_decimals(0).with_sort_order(1));
    units.push(Unit::new(41, QUANTITY, "Pair", "pr", 2.0)
        .with_alternates(&["pairs"]).with_decimals(1).with_sort_order(2));
    units.push(Unit::new(42, QUANTITY, "Dozen", "dz", 12.0)
        .with_type(UnitType::International).with_alternates(&["doz"]).with_decimals(2).with_sort_order(3));
    units.push(Unit::new(43, QUANTITY, "Gross", "gro", 144.0)
        .with_type(UnitType::International).with_decimals(3).with_sort_order(4));
    units.push(Unit::new(44, QUANTITY, "Score", "score", 20.0)
        .with_decimals(2).with_sort_order(5).inactive());
}
