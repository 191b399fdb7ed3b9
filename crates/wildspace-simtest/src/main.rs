//! Wildspace Headless Harness
//!
//! Builds a seeded world, lays the authored features over it, carves rivers
//! and sails vessels across it, checking the engine's guarantees as it goes.
//! Runs entirely in-process against the real noise heightmap.
//!
//! Usage:
//!   cargo run -p wildspace-simtest
//!   cargo run -p wildspace-simtest -- --verbose
//!   RUST_LOG=debug cargo run -p wildspace-simtest

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wildspace_core::generation::generate_interior;
use wildspace_core::prelude::*;
use wildspace_core::systems;
use wildspace_core::world::TerrainSampler;
use wildspace_logic::coords::{validate, ALTITUDE_LIMIT, PLANE_X_LIMIT, PLANE_Y_LIMIT};
use wildspace_logic::error::MoveRejection;
use wildspace_logic::interior::validate_interior;
use wildspace_logic::sectors::{classify, temperature_at};
use wildspace_logic::vessels::{can_traverse, rooms_for_class};

// ── World data (same JSON a game server would load) ─────────────────────
const CONFIG_JSON: &str = include_str!("../../../data/engine_config.json");
const FEATURES_JSON: &str = include_str!("../../../data/world_features.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Wildspace Spatial Harness ===\n");

    let config = match EngineConfig::from_json(CONFIG_JSON) {
        Ok(c) => c,
        Err(e) => {
            println!("  ✗ config_parse: {}", e);
            std::process::exit(1);
        }
    };
    let mut engine = match SpatialEngine::new(config.clone()) {
        Ok(e) => e,
        Err(e) => {
            println!("  ✗ engine_new: {}", e);
            std::process::exit(1);
        }
    };

    let mut results = Vec::new();

    // 1. Bounds
    results.extend(validate_bounds(verbose));

    // 2. Heightmap terrain
    results.extend(validate_terrain(&engine, &config, verbose));

    // 3. Wilderness room allocation
    results.extend(validate_rooms(&engine, &config, verbose));

    // 4. Authored features
    results.extend(validate_features(&engine, verbose));

    // 5. River carving
    results.extend(validate_rivers(&mut engine, verbose));

    // 6. Vessels
    results.extend(validate_vessels(&mut engine, verbose));

    // 7. Interior generation sweep
    results.extend(validate_interiors(&config, verbose));

    // 8. Save/load
    results.extend(validate_persistence(&engine, &config, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

/// First coordinate on a coarse grid whose sector satisfies `pred`.
fn find_sector(engine: &SpatialEngine, pred: impl Fn(Sector) -> bool) -> Option<Coord> {
    for y in (-PLANE_Y_LIMIT..=PLANE_Y_LIMIT).step_by(16) {
        for x in (-PLANE_X_LIMIT..=PLANE_X_LIMIT).step_by(16) {
            if engine.sector_at(x, y).map(&pred).unwrap_or(false) {
                return Some(Coord::new(x, y));
            }
        }
    }
    None
}

// ── 1. Bounds ───────────────────────────────────────────────────────────

fn validate_bounds(verbose: bool) -> Vec<TestResult> {
    println!("--- Bounds ---");
    let mut results = Vec::new();

    let corners = [
        (PLANE_X_LIMIT, PLANE_Y_LIMIT, ALTITUDE_LIMIT),
        (-PLANE_X_LIMIT, -PLANE_Y_LIMIT, -ALTITUDE_LIMIT),
    ];
    let outside = [
        (PLANE_X_LIMIT + 1, 0, 0),
        (0, -PLANE_Y_LIMIT - 1, 0),
        (0, 0, ALTITUDE_LIMIT + 1),
        (i32::MIN, i32::MAX, 0),
    ];
    results.push(TestResult::new(
        "bounds_closed",
        corners.iter().all(|&(x, y, z)| validate(x, y, z))
            && outside.iter().all(|&(x, y, z)| !validate(x, y, z)),
        "edges accepted, one step beyond rejected",
    ));

    if verbose {
        println!(
            "  plane ±{} x ±{}, altitude ±{}",
            PLANE_X_LIMIT, PLANE_Y_LIMIT, ALTITUDE_LIMIT
        );
    }
    results
}

// ── 2. Terrain ──────────────────────────────────────────────────────────

fn validate_terrain(engine: &SpatialEngine, config: &EngineConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Heightmap Terrain ---");
    let mut results = Vec::new();

    let again = match SpatialEngine::new(config.clone()) {
        Ok(e) => e,
        Err(e) => {
            results.push(TestResult::new("terrain_deterministic", false, e.to_string()));
            return results;
        }
    };
    let samples = [(0, 0), (333, -517), (-1024, 1024), (640, 12)];
    let same = samples.iter().all(|&(x, y)| {
        let c = Coord::new(x, y);
        engine.terrain().elevation(c) == again.terrain().elevation(c)
            && engine.terrain().moisture(c) == again.terrain().moisture(c)
    });
    results.push(TestResult::new(
        "terrain_deterministic",
        same,
        format!("seed {} reproduces elevation and moisture", config.seed),
    ));

    let mut seen = HashSet::new();
    let mut water = 0;
    let mut samples = 0;
    for y in (-PLANE_Y_LIMIT..=PLANE_Y_LIMIT).step_by(32) {
        for x in (-PLANE_X_LIMIT..=PLANE_X_LIMIT).step_by(32) {
            let c = Coord::new(x, y);
            let e = engine.terrain().elevation(c);
            let m = engine.terrain().moisture(c);
            if !(0..=255).contains(&e) || !(0..=255).contains(&m) {
                results.push(TestResult::new(
                    "terrain_ranges",
                    false,
                    format!("({}, {}) elevation {} moisture {}", x, y, e, m),
                ));
                return results;
            }
            let s = engine.terrain().base_sector(c);
            water += s.is_water() as usize;
            samples += 1;
            seen.insert(s);
        }
    }
    results.push(TestResult::new(
        "terrain_ranges",
        true,
        format!("{} samples within 0..=255", samples),
    ));
    results.push(TestResult::new(
        "terrain_has_land_and_sea",
        water > 0 && water < samples,
        format!("{} of {} samples are water", water, samples),
    ));
    results.push(TestResult::new(
        "terrain_varied",
        seen.len() >= 4,
        format!("{} distinct base sectors", seen.len()),
    ));

    if verbose {
        let mut names: Vec<_> = seen.iter().map(|s| s.name()).collect();
        names.sort();
        println!("  sectors: {}", names.join(", "));
    }
    results
}

// ── 3. Wilderness Rooms ─────────────────────────────────────────────────

fn validate_rooms(engine: &SpatialEngine, config: &EngineConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Wilderness Rooms ---");
    let mut results = Vec::new();

    let mut rooms = HashSet::new();
    let mut errors = Vec::new();
    for x in 500..530 {
        for y in 500..530 {
            match engine.allocate_or_get_room(x, y) {
                Ok(r) => {
                    rooms.insert(r);
                    if engine.allocate_or_get_room(x, y) != Ok(r) {
                        errors.push(format!("({}, {}) not idempotent", x, y));
                    }
                    if engine.room_coordinate(r) != Ok(Coord::new(x, y)) {
                        errors.push(format!("room {} does not map back", r));
                    }
                }
                Err(e) => errors.push(format!("({}, {}): {}", x, y, e)),
            }
        }
    }
    results.push(TestResult::new(
        "rooms_bijective",
        errors.is_empty() && rooms.len() == 900,
        if errors.is_empty() {
            format!("{} coordinates, {} distinct rooms", 900, rooms.len())
        } else {
            errors[..errors.len().min(3)].join("; ")
        },
    ));

    let swept = engine.sweep_rooms();
    results.push(TestResult::new(
        "rooms_swept",
        swept == 900 && engine.rooms().bound_count() == 0,
        format!("{} idle rooms returned to the pool", swept),
    ));

    let tiny = match SpatialEngine::new(EngineConfig {
        dynamic_pool_end: config.dynamic_pool_start + 9,
        ..config.clone()
    }) {
        Ok(e) => e,
        Err(e) => {
            results.push(TestResult::new("rooms_pool_exhaustion", false, e.to_string()));
            return results;
        }
    };
    let filled = (0..10).all(|i| tiny.allocate_or_get_room(i, 0).is_ok());
    let exhausted = matches!(
        tiny.allocate_or_get_room(10, 0),
        Err(SpatialError::PoolExhausted { capacity: 10 })
    );
    results.push(TestResult::new(
        "rooms_pool_exhaustion",
        filled && exhausted,
        "eleventh coordinate refused from a ten-room pool",
    ));

    results.push(TestResult::new(
        "rooms_consistent",
        engine.rooms().check_consistency() && tiny.rooms().check_consistency(),
        "coordinate map, pool and free list agree",
    ));

    if verbose {
        println!(
            "  pool {}..={} ({} rooms)",
            config.dynamic_pool_start,
            config.dynamic_pool_end,
            config.pool_capacity()
        );
    }
    results
}

// ── 4. Features ─────────────────────────────────────────────────────────

fn validate_features(engine: &SpatialEngine, verbose: bool) -> Vec<TestResult> {
    println!("--- Authored Features ---");
    let mut results = Vec::new();

    let features: Vec<Feature> = match serde_json::from_str(FEATURES_JSON) {
        Ok(f) => f,
        Err(e) => {
            results.push(TestResult::new(
                "features_parse",
                false,
                format!("JSON parse error: {}", e),
            ));
            return results;
        }
    };

    // Bind a room first so insertion has something to reclassify
    let watched = engine.allocate_or_get_room(-140, -160).ok();
    let before = watched.and_then(|r| engine.room_profile(r));

    let count = features.len();
    let inserted = features
        .into_iter()
        .map(|f| engine.insert_feature(f))
        .filter(Result::is_ok)
        .count();
    results.push(TestResult::new(
        "features_loaded",
        inserted == count && count == 6,
        format!("{}/{} features indexed", inserted, count),
    ));

    let at_crossroads = engine.query_features(-150, -150);
    let expected: Vec<FeatureId> = [1, 2, 4, 5, 6].into_iter().map(FeatureId).collect();
    results.push(TestResult::new(
        "features_point_query",
        at_crossroads == expected,
        format!("{:?} at (-150, -150)", at_crossroads),
    ));

    let crossroads = engine.describe(Coord::new(-150, -150));
    results.push(TestResult::new(
        "features_paths_win",
        crossroads.name == "Drover's Track"
            && crossroads.sector == Sector::DirtRoadIntersection
            && crossroads.encounters == vec!["Wolf Country".to_string()],
        format!("{} / {}", crossroads.name, crossroads.sector.name()),
    ));

    let after = watched.and_then(|r| engine.room_profile(r));
    let reclassified = after.as_ref().is_some_and(|p| {
        p.name == "The Greenmarch"
            && p.sector == Sector::Forest
            && p.encounters == vec!["Wolf Country".to_string()]
    });
    results.push(TestResult::new(
        "features_reclassify_bound_room",
        reclassified,
        format!(
            "{:?} -> {:?}",
            before.map(|p| p.sector),
            after.map(|p| p.sector)
        ),
    ));

    let vale = Coord::new(300, 200);
    let t = *engine.terrain().thresholds();
    let elevation = (engine.terrain().elevation(vale) - 60).clamp(0, 255);
    let expected_sector = classify(
        elevation,
        temperature_at(vale.y, elevation, t.waterline),
        engine.terrain().moisture(vale),
        &t,
    );
    results.push(TestResult::new(
        "features_sector_transform",
        engine.sector_at(vale.x, vale.y) == Ok(expected_sector),
        format!("Sunken Vale classifies as {}", expected_sector.name()),
    ));

    let nearby = engine.query_features_radius(-150, -150, 60.0);
    results.push(TestResult::new(
        "features_radius_query",
        nearby.len() == 5 && !nearby.contains(&FeatureId(3)),
        format!("{} features within 60 of the crossroads", nearby.len()),
    ));

    if verbose {
        for f in engine.index().iter() {
            println!("  {} '{}' bounds {:?}", f.id, f.name, f.bounds());
        }
    }
    results
}

// ── 5. Rivers ───────────────────────────────────────────────────────────

fn validate_rivers(engine: &mut SpatialEngine, verbose: bool) -> Vec<TestResult> {
    println!("--- River Carving ---");
    let mut results = Vec::new();

    let mut rng = StdRng::seed_from_u64(engine.config().seed);
    let max_length = engine.config().river.max_length;
    let edge_margin = engine.config().river.max_lateral_offset + 1;
    let mut carved = 0;
    let mut problems = Vec::new();

    for n in 0..12u32 {
        let start = Coord::new(rng.gen_range(-900..=900), rng.gen_range(-900..=900));
        let direction = Direction::COMPASS[rng.gen_range(0..Direction::COMPASS.len())];
        let id = FeatureId(100 + n);
        let name = format!("River {}", n + 1);
        match engine.generate_terrain(start, direction, id, &name) {
            Ok(feature) => {
                carved += 1;
                let Shape::Path { points, .. } = &feature.shape else {
                    problems.push(format!("{} is not a path", id));
                    continue;
                };
                if points.first() != Some(&start) {
                    problems.push(format!("{} does not start at its source", id));
                }
                if points.iter().any(|p| !p.is_valid()) {
                    problems.push(format!("{} leaves the plane", id));
                }
                // A river ends in water, at its length cap, or at the map edge
                let last = points[points.len() - 1];
                let ended_well = points.len() == max_length
                    || ends_in_water(engine, last, id)
                    || last.x.abs() + edge_margin >= PLANE_X_LIMIT
                    || last.y.abs() + edge_margin >= PLANE_Y_LIMIT;
                if !ended_well {
                    problems.push(format!("{} stopped early", id));
                }
                if verbose {
                    println!(
                        "  {} from ({}, {}) {} : {} points",
                        name,
                        start.x,
                        start.y,
                        direction,
                        points.len()
                    );
                }
            }
            Err(e) => problems.push(format!("{}: {}", id, e)),
        }
    }
    results.push(TestResult::new(
        "rivers_carved",
        carved == 12 && problems.is_empty(),
        if problems.is_empty() {
            format!("{} rivers carved", carved)
        } else {
            problems.join("; ")
        },
    ));

    let count = engine.index().len();
    let refused = matches!(
        engine.generate_terrain(Coord::new(0, 5000), Direction::North, FeatureId(999), "Lost"),
        Err(SpatialError::OutOfBounds { .. })
    );
    let not_compass = matches!(
        engine.generate_terrain(Coord::ORIGIN, Direction::Up, FeatureId(998), "Upstream"),
        Err(SpatialError::InvalidDirection(Direction::Up))
    );
    results.push(TestResult::new(
        "rivers_reject_bad_input",
        refused && not_compass && engine.index().len() == count,
        "off-plane start and vertical direction leave the index unchanged",
    ));

    results
}

/// Water at `at` from the terrain or from any feature other than `river`.
fn ends_in_water(engine: &SpatialEngine, at: Coord, river: FeatureId) -> bool {
    engine.terrain().is_water(at)
        || engine
            .query_features(at.x, at.y)
            .into_iter()
            .filter(|&id| id != river)
            .filter_map(|id| engine.feature(id))
            .any(|f| match f.kind {
                FeatureKind::Region(RegionKind::Sector(s)) => s.is_water(),
                FeatureKind::Path { sector, .. } => sector.is_water(),
                _ => false,
            })
}

// ── 6. Vessels ──────────────────────────────────────────────────────────

fn validate_vessels(engine: &mut SpatialEngine, verbose: bool) -> Vec<TestResult> {
    println!("--- Vessels ---");
    let mut results = Vec::new();

    let Some(sea) = find_sector(engine, |s| s == Sector::Ocean) else {
        results.push(TestResult::new("vessels_find_sea", false, "no ocean on the map"));
        return results;
    };
    let Some(land) = find_sector(engine, |s| !s.is_water() && s != Sector::Lava) else {
        results.push(TestResult::new("vessels_find_land", false, "no land on the map"));
        return results;
    };

    let ship = match engine.spawn_vessel(VesselSpec::new("Sea Wolf", 300, sea.x, sea.y, 0)) {
        Ok(id) => id,
        Err(e) => {
            results.push(TestResult::new("vessels_launch", false, e.to_string()));
            return results;
        }
    };
    results.push(TestResult::new(
        "vessels_launch",
        engine.vessel_room(ship).is_some(),
        format!("{} launched at ({}, {})", ship, sea.x, sea.y),
    ));

    // Sail one step onto any neighbouring square the ship can enter
    let mut sailed = None;
    for dir in Direction::COMPASS {
        if let Ok(outcome) = engine.move_vessel_direction(ship, dir) {
            sailed = Some((dir, outcome));
            break;
        }
    }
    let heading_ok = sailed.is_some_and(|(dir, _)| {
        engine
            .vessel_position(ship)
            .is_ok_and(|p| p.heading == dir)
    });
    results.push(TestResult::new(
        "vessels_sail",
        heading_ok,
        match sailed {
            Some((dir, o)) => format!("sailed {} into {} at {}%", dir, o.sector.name(), o.speed),
            None => "boxed in on every side".into(),
        },
    ));

    let before = engine.vessel_position(ship).ok();
    let bound = engine.rooms().bound_count();
    let beached = engine.move_vessel(ship, land.x, land.y, 0);
    results.push(TestResult::new(
        "vessels_refuse_land",
        matches!(
            beached,
            Err(SpatialError::Rejected(MoveRejection::Terrain { .. }))
        ) && engine.vessel_position(ship).ok() == before
            && engine.rooms().bound_count() == bound,
        format!("({}, {}) refused, state unchanged", land.x, land.y),
    ));

    let airship = engine.spawn_vessel(
        VesselSpec::new("Cloudbreaker", 300, land.x, land.y, 200).class(VesselClass::Airship),
    );
    let crossed = airship.as_ref().is_ok_and(|&id| {
        engine.move_vessel(id, sea.x, sea.y, 200).is_ok()
            && engine.move_vessel(id, land.x, land.y, 450).is_ok()
    });
    results.push(TestResult::new(
        "vessels_airship_crosses",
        crossed,
        "airship flies land to sea and back",
    ));

    let here = engine.vessel_position(ship).map(|p| p.coord()).unwrap_or(sea);
    let tender = engine.spawn_vessel(VesselSpec::new("Tender", 300, here.x, here.y, 0));
    let docked = tender
        .as_ref()
        .is_ok_and(|&t| engine.dock_vessels(ship, t).is_ok());
    let held = docked
        && matches!(
            engine.move_vessel(ship, here.x, here.y, 0),
            Err(SpatialError::Rejected(MoveRejection::Docked))
        );
    let cast_off = tender
        .as_ref()
        .is_ok_and(|&t| engine.undock_vessel(t) == Ok(Some(ship)));
    results.push(TestResult::new(
        "vessels_docking",
        docked && held && cast_off,
        "dock, refuse to sail while docked, cast off",
    ));

    let seen = engine.contacts(ship).unwrap_or_default();
    let tender_seen = tender
        .as_ref()
        .is_ok_and(|&t| seen.first().is_some_and(|c| c.id == t && c.range == 0.0));
    results.push(TestResult::new(
        "vessels_contacts",
        tender_seen,
        format!("{} contacts, tender alongside at range 0", seen.len()),
    ));

    // Autopilot the ship back to where it was launched
    let mut route = Route::new("Homeward");
    let homeward = route
        .add_waypoint(Waypoint::new("Launch", sea.x, sea.y, 0).tolerance(0.5))
        .and_then(|_| engine.start_autopilot(ship, route));
    let mut ticks = 0;
    while homeward.is_ok() && ticks < 10 && engine.autopilot_tick() > 0 {
        ticks += 1;
    }
    let home = engine.vessel_position(ship).is_ok_and(|p| p.coord() == sea);
    results.push(TestResult::new(
        "vessels_autopilot",
        home && engine
            .autopilot(ship)
            .is_some_and(|p| p.state == AutopilotState::Complete),
        format!("route complete after {} ticks", ticks),
    ));

    let boarded = engine.board_vessel(ship).and_then(|entrance| {
        let interior = engine
            .interior(ship)
            .ok_or(SpatialError::NotFound(wildspace_logic::error::Missing::Interior(ship)))?;
        let path = engine.interior_path(entrance, interior.bridge)?;
        let mut at = entrance;
        for step in &path {
            at = engine.interior_exit(at, step.direction)?;
        }
        let frame = engine.interior_room_coordinates(at)?;
        Ok((at == interior.bridge, frame, path.len()))
    });
    let pos = engine.vessel_position(ship).ok();
    results.push(TestResult::new(
        "vessels_board_and_walk",
        matches!(boarded, Ok((true, (x, y, z), _))
            if pos.is_some_and(|p| p.coord() == Coord::new(x, y) && p.altitude() == z)),
        match &boarded {
            Ok((_, _, hops)) => format!("entrance to bridge in {} hops", hops),
            Err(e) => e.to_string(),
        },
    ));

    let fleet = systems::vessel_ids(&engine.world);
    if verbose {
        for id in &fleet {
            if let (Some(v), Ok(p)) = (engine.vessel(*id), engine.vessel_position(*id)) {
                println!(
                    "  {} '{}' {} at ({}, {}, {}) heading {}",
                    id, v.name, v.class, p.x, p.y, p.z, p.heading
                );
            }
        }
    }
    results
}

// ── 7. Interiors ────────────────────────────────────────────────────────

fn validate_interiors(config: &EngineConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Interior Generation ---");
    let mut results = Vec::new();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut generated = 0;
    let mut problems = Vec::new();
    for round in 0..100u32 {
        for class in VesselClass::ALL {
            let id = VesselId(round % 500);
            match generate_interior(id, class, &mut rng, config.discovery_chance) {
                Ok(interior) => {
                    generated += 1;
                    let (base, max) = rooms_for_class(class);
                    if interior.num_rooms < base || interior.num_rooms > max {
                        problems.push(format!("{} has {} rooms", class, interior.num_rooms));
                    }
                    for err in validate_interior(&interior) {
                        problems.push(format!("{} [{}] {}", class, err.category, err.message));
                    }
                }
                Err(e) => problems.push(format!("{}: {}", class, e)),
            }
        }
    }
    results.push(TestResult::new(
        "interiors_valid",
        problems.is_empty(),
        if problems.is_empty() {
            format!("{} interiors within room limits and fully connected", generated)
        } else {
            problems[..problems.len().min(3)].join("; ")
        },
    ));

    let classes_fit = VesselClass::ALL.iter().all(|&class| {
        Sector::all()
            .iter()
            .any(|&sector| can_traverse(class, sector, 0))
    });
    results.push(TestResult::new(
        "interiors_classes_have_terrain",
        classes_fit,
        "every class can sit somewhere at sea level",
    ));

    if verbose {
        for class in VesselClass::ALL {
            let (base, max) = rooms_for_class(class);
            println!("  {:<10} {}..={} rooms", class.name(), base, max);
        }
    }
    results
}

// ── 8. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(engine: &SpatialEngine, config: &EngineConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Save/Load ---");
    let mut results = Vec::new();

    let mut buffer = Vec::new();
    if let Err(e) = engine.save(&mut buffer) {
        results.push(TestResult::new("persist_save", false, e.to_string()));
        return results;
    }

    let mut restored = match SpatialEngine::new(config.clone()) {
        Ok(e) => e,
        Err(e) => {
            results.push(TestResult::new("persist_load", false, e.to_string()));
            return results;
        }
    };
    if let Err(e) = restored.load(&buffer[..]) {
        results.push(TestResult::new("persist_load", false, e.to_string()));
        return results;
    }

    let same_rooms = restored.rooms().snapshot() == engine.rooms().snapshot();
    let same_features = restored.index().iter().eq(engine.index().iter());
    let same_vessels = systems::vessel_ids(&restored.world)
        .into_iter()
        .all(|id| {
            restored.vessel_position(id) == engine.vessel_position(id)
                && restored.interior(id) == engine.interior(id)
        });
    results.push(TestResult::new(
        "persist_roundtrip",
        same_rooms
            && same_features
            && same_vessels
            && restored.vessel_count() == engine.vessel_count(),
        format!(
            "{} bytes: {} rooms, {} features, {} vessels",
            buffer.len(),
            restored.rooms().bound_count() + restored.rooms().static_count(),
            restored.index().len(),
            restored.vessel_count()
        ),
    ));

    if verbose {
        println!("  save format v{}", wildspace_core::persistence::SAVE_VERSION);
    }
    results
}
