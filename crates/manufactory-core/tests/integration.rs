//! End-to-end production scenarios driven through the public API.

use manufactory_core::config::EconomyConfig;
use manufactory_core::craft::{Craft, CraftStatus};
use manufactory_core::event::{EventKind, ProductionEvent};
use manufactory_core::game::Game;
use manufactory_core::personnel::TransferCargo;
use manufactory_core::production::{ProductionOrder, ProductionProgress, StallReason};
use manufactory_core::registry::{ItemAmount, ManufactureRule, SpawnedPerson, SoldierTemplate};
use manufactory_core::serialize::{load_workshop, records_from_json, records_to_json, save_workshop};
use manufactory_core::test_utils::*;
use manufactory_core::text::StringTable;

fn kinds(events: &[ProductionEvent]) -> Vec<EventKind> {
    events.iter().map(ProductionEvent::kind).collect()
}

// ===========================================================================
// Reference scenarios
// ===========================================================================

/// Cost 100, 10 labor per unit, target 3, one engineer, funds 250.
#[test]
fn three_units_with_one_engineer() {
    let mut h = Harness::new(250);
    h.base.items.add(alloys(), 3);
    let mut order = ProductionOrder::new(laser_rifle_recipe(), 3);
    order.set_assigned_workers(1);

    assert_eq!(h.step(&mut order), ProductionProgress::NotComplete);
    assert_eq!(order.elapsed_labor(), 1);

    for _ in 1..10 {
        assert_eq!(h.step(&mut order), ProductionProgress::NotComplete);
    }
    assert_eq!(order.elapsed_labor(), 10);
    assert_eq!(order.completed_units(h.rule(laser_rifle_recipe())), 1);
    assert_eq!(h.base.items.quantity(laser_rifle()), 1);
    assert_eq!(h.economy.funds(), 150);

    let mut last = ProductionProgress::NotComplete;
    for _ in 10..30 {
        last = h.step(&mut order);
    }
    assert_eq!(last, ProductionProgress::Complete);
    assert_eq!(order.elapsed_labor(), 30);
    assert_eq!(h.base.items.quantity(laser_rifle()), 3);
    assert_eq!(h.economy.funds(), 50);
}

/// Funds 50 when the second unit would start.
#[test]
fn second_unit_unaffordable() {
    let mut h = Harness::new(50);
    h.base.items.add(alloys(), 3);
    let mut order = ProductionOrder::new(laser_rifle_recipe(), 3);
    order.set_assigned_workers(1);

    let mut last = ProductionProgress::NotComplete;
    for _ in 0..10 {
        last = h.step(&mut order);
    }
    assert_eq!(last, ProductionProgress::NotEnoughMoney);
    assert_eq!(order.elapsed_labor(), 10);
    assert_eq!(order.completed_units(h.rule(laser_rifle_recipe())), 1);
    assert_eq!(h.base.items.quantity(laser_rifle()), 1);
    assert_eq!(h.base.items.quantity(alloys()), 3);
    assert_eq!(h.economy.funds(), 50);
}

// ===========================================================================
// Scheduler
// ===========================================================================

#[test]
fn blocked_order_resumes_after_funds_restored() {
    let rules = standard_rules();
    let lang = StringTable::new();
    let mut game = Game::new(100, EconomyConfig::default(), 1);
    let mut base = test_base();
    base.items.add(alloys(), 3);
    let id = game.add_base(base);

    game.start_order(id, &rules, laser_rifle_recipe(), 3).unwrap();
    game.set_assigned_workers(id, &rules, 0, 10).unwrap();

    let events = game.advance_production(&rules, &lang);
    assert_eq!(
        kinds(&events),
        vec![EventKind::UnitsCompleted, EventKind::OrderStalled]
    );
    assert!(matches!(
        events[1],
        ProductionEvent::OrderStalled {
            reason: StallReason::NotEnoughMoney,
            ..
        }
    ));

    // Realized output survives the stall.
    assert_eq!(game.base(id).unwrap().items.quantity(laser_rifle()), 1);
    for _ in 0..3 {
        assert!(game.advance_production(&rules, &lang).is_empty());
    }

    game.economy.add_funds(1_000);
    let mut all = Vec::new();
    for _ in 0..3 {
        all.extend(game.advance_production(&rules, &lang));
    }
    assert_eq!(
        kinds(&all),
        vec![
            EventKind::OrderResumed,
            EventKind::UnitsCompleted,
            EventKind::UnitsCompleted,
            EventKind::OrderCompleted,
        ]
    );
    let base = game.base(id).unwrap();
    assert_eq!(base.items.quantity(laser_rifle()), 3);
    assert_eq!(base.items.quantity(alloys()), 0);
    assert_eq!(base.engineers, 10);
    assert_eq!(game.economy.funds(), 1_000 - 200);
    assert!(game.workshop(id).unwrap().is_empty());
}

/// 30 engineers finish all three rifles in one pass, but only the first
/// unit was paid for when the order was queued.
#[test]
fn order_blocked_mid_batch_delivers_every_unit_after_funding() {
    let rules = standard_rules();
    let lang = StringTable::new();
    let mut game = Game::new(100, EconomyConfig::default(), 1);
    let mut base = test_base();
    base.items.add(alloys(), 5);
    base.engineers = 30;
    let id = game.add_base(base);

    game.start_order(id, &rules, laser_rifle_recipe(), 3).unwrap();
    game.set_assigned_workers(id, &rules, 0, 30).unwrap();

    let events = game.advance_production(&rules, &lang);
    assert_eq!(
        kinds(&events),
        vec![EventKind::UnitsCompleted, EventKind::OrderStalled]
    );
    assert_eq!(game.economy.funds(), 0);
    assert_eq!(game.base(id).unwrap().items.quantity(laser_rifle()), 1);

    game.economy.add_funds(1_000);
    let events = game.advance_production(&rules, &lang);
    assert!(matches!(
        events[..],
        [
            ProductionEvent::UnitsCompleted { units: 2, .. },
            ProductionEvent::OrderCompleted { .. },
        ]
    ));

    let base = game.base(id).unwrap();
    assert_eq!(base.items.quantity(laser_rifle()), 3);
    assert_eq!(base.items.quantity(alloys()), 2);
    assert_eq!(base.engineers, 30);
    // Three rifles, three payments of 100.
    assert_eq!(game.economy.funds(), 1_000 - 200);
    assert!(game.workshop(id).unwrap().is_empty());
}

#[test]
fn living_space_stalls_person_production() {
    let rules = standard_rules();
    let lang = StringTable::new();
    let mut game = Game::new(1_000, EconomyConfig::default(), 1);
    let mut base = test_base();
    base.living_quarters = 11;
    let id = game.add_base(base);

    game.start_order(id, &rules, scientist_recipe(), 5).unwrap();
    game.set_assigned_workers(id, &rules, 0, 5).unwrap();

    // Ten engineers plus one scientist in transit fill eleven beds.
    let events = game.advance_production(&rules, &lang);
    assert!(events.contains(&ProductionEvent::OrderStalled {
        base: id,
        recipe: scientist_recipe(),
        reason: StallReason::NotEnoughLivingSpace,
        hour: 1,
    }));

    game.base_mut(id).unwrap().living_quarters = 20;
    let events = game.advance_production(&rules, &lang);
    assert_eq!(events[0].kind(), EventKind::OrderResumed);
}

#[test]
fn dismantling_consumes_craft_and_rolls_bonus() {
    let rules = standard_rules();
    let lang = StringTable::new();
    let mut game = Game::new(10_000, EconomyConfig::default(), 3);
    let mut base = test_base();
    base.crafts.push(Craft::new(skyranger(), 1));
    base.crafts.push(Craft::new(skyranger(), 2));
    let id = game.add_base(base);

    game.start_order(id, &rules, dismantle_recipe(), 2).unwrap();
    assert_eq!(game.base(id).unwrap().craft_count(skyranger()), 1);
    // Consumed craft stay consumed on cancel.
    game.cancel_order(id, &rules, 0).unwrap();
    assert_eq!(game.base(id).unwrap().craft_count(skyranger()), 1);
    assert_eq!(game.economy.funds(), 10_000);

    game.start_order(id, &rules, dismantle_recipe(), 1).unwrap();
    game.set_assigned_workers(id, &rules, 0, 10).unwrap();
    for _ in 0..5 {
        game.advance_production(&rules, &lang);
    }
    let base = game.base(id).unwrap();
    assert_eq!(base.craft_count(skyranger()), 0);
    assert_eq!(base.items.quantity(alloys()), 2);
    let bonus = base.items.quantity(elerium()) + base.items.quantity(missiles());
    assert!(bonus == 1 || bonus == 2, "bonus roll missing: {bonus}");
}

#[test]
fn produced_interceptor_joins_roster_armed() {
    let rules = standard_rules();
    let lang = StringTable::new();
    let mut game = Game::new(10_000, EconomyConfig::default(), 3);
    let id = game.add_base(test_base());

    game.start_order(id, &rules, interceptor_recipe(), 2).unwrap();
    game.set_assigned_workers(id, &rules, 0, 10).unwrap();
    for _ in 0..4 {
        game.advance_production(&rules, &lang);
    }
    let base = game.base(id).unwrap();
    let serials: Vec<u32> = base.crafts.iter().map(|c| c.serial).collect();
    assert_eq!(serials, vec![1, 2]);
    assert!(base.crafts.iter().all(|c| c.weapons[0].ammo == 6));
    assert!(base.crafts.iter().all(|c| c.status == CraftStatus::Refuelling));
    assert!(base.items.is_empty());
}

#[test]
fn liquidated_output_is_sold_at_factor() {
    let rules = standard_rules();
    let lang = StringTable::new();
    let config = EconomyConfig {
        sell_price_factor: fixed(0.5),
        ..Default::default()
    };
    let mut game = Game::new(1_000, config, 3);
    let mut base = test_base();
    base.items.add(alloys(), 2);
    let id = game.add_base(base);

    game.start_order(id, &rules, laser_rifle_recipe(), 2).unwrap();
    game.set_liquidate_output(id, 0, true).unwrap();
    game.set_assigned_workers(id, &rules, 0, 10).unwrap();
    game.advance_production(&rules, &lang);
    game.advance_production(&rules, &lang);

    assert_eq!(game.base(id).unwrap().items.quantity(laser_rifle()), 0);
    assert_eq!(game.economy.funds(), 1_000 - 200 + 2 * 18_450);
}

#[test]
fn cloned_soldier_arrives_named_with_score_penalty() {
    let rules = standard_rules();
    let mut lang = StringTable::new();
    lang.insert("STR_CLONE_NAME", "Clone");
    let mut game = Game::new(10_000, EconomyConfig::default(), 11);
    let id = game.add_base(test_base());

    game.start_order(id, &rules, clone_recipe(), 1).unwrap();
    game.set_assigned_workers(id, &rules, 0, 10).unwrap();
    for _ in 0..10 {
        game.advance_production(&rules, &lang);
    }
    assert_eq!(game.economy.research_score(), -5);
    game.advance_transfers(24);
    let soldier = &game.base(id).unwrap().soldiers[0];
    assert_eq!(soldier.name, "Clone");
    assert_eq!(soldier.serial, 1);
    assert!((50..=60).contains(&soldier.stats.time_units));
}

#[test]
fn unknown_person_type_spawns_nothing() {
    let mut builder = standard_builder();
    let mut rule = ManufactureRule::new("STR_SUMMON", 0, 1);
    rule.spawned_person = Some(SpawnedPerson {
        person_type: "STR_NOBODY".into(),
        template: SoldierTemplate::default(),
        custom_name: None,
    });
    rule.produced_items.push(ItemAmount::new(alloys(), 1));
    let recipe = builder.register_manufacture(rule);
    let rules = builder.build().unwrap();
    let lang = StringTable::new();

    let mut game = Game::new(0, EconomyConfig::default(), 1);
    let id = game.add_base(test_base());
    game.start_order(id, &rules, recipe, 1).unwrap();
    game.set_assigned_workers(id, &rules, 0, 1).unwrap();
    let events = game.advance_production(&rules, &lang);

    assert_eq!(events.last().unwrap().kind(), EventKind::OrderCompleted);
    let base = game.base(id).unwrap();
    assert!(base.transfers.is_empty());
    assert_eq!(base.items.quantity(alloys()), 1);
}

#[test]
fn staff_types_follow_config() {
    let rules = standard_rules();
    let lang = StringTable::new();
    let config = EconomyConfig {
        scientist_type: "STR_RESEARCHER".into(),
        engineer_type: "STR_SCIENTIST".into(),
        person_transfer_hours: 12,
        ..Default::default()
    };
    let mut game = Game::new(1_000, config, 1);
    let id = game.add_base(test_base());
    game.start_order(id, &rules, scientist_recipe(), 1).unwrap();
    game.set_assigned_workers(id, &rules, 0, 5).unwrap();
    game.advance_production(&rules, &lang);

    let transfer = &game.base(id).unwrap().transfers[0];
    assert_eq!(transfer.hours, 12);
    assert_eq!(transfer.cargo, TransferCargo::Engineers(1));
}

// ===========================================================================
// Persistence
// ===========================================================================

#[test]
fn saved_queue_resumes_where_it_left_off() {
    let rules = standard_rules();
    let lang = StringTable::new();
    let mut game = Game::new(10_000, EconomyConfig::default(), 5);
    let mut base = test_base();
    base.items.add(alloys(), 5);
    let id = game.add_base(base);
    game.start_order(id, &rules, laser_rifle_recipe(), 4).unwrap();
    game.set_assigned_workers(id, &rules, 0, 4).unwrap();
    for _ in 0..6 {
        game.advance_production(&rules, &lang);
    }

    let json = records_to_json(&save_workshop(game.workshop(id).unwrap(), &rules)).unwrap();
    let records = records_from_json(&json).unwrap();
    let restored = load_workshop(&records, &rules, &game.economy.config);
    let order = restored.order(0).unwrap();
    assert_eq!(order.elapsed_labor(), 24);
    assert_eq!(order.assigned_workers(), 4);
    assert_eq!(order.target_amount(), 4);

    game.set_workshop(id, restored).unwrap();
    for _ in 0..4 {
        game.advance_production(&rules, &lang);
    }
    assert_eq!(game.base(id).unwrap().items.quantity(laser_rifle()), 4);
    assert!(game.workshop(id).unwrap().is_empty());
}

#[test]
fn legacy_sell_forever_save_loads_as_unbounded_sale() {
    let rules = standard_rules();
    let json = format!(
        r#"[{{"item": "STR_ELERIUM_115", "assigned": 2, "spent": 3, "amount": {}, "infinite": false}}]"#,
        i32::MAX
    );
    let records = records_from_json(&json).unwrap();
    let workshop = load_workshop(&records, &rules, &EconomyConfig::default());
    let order = workshop.order(0).unwrap();
    assert_eq!(order.target_amount(), 999);
    assert!(order.unbounded());
    assert!(order.liquidate_output());
    assert_eq!(order.elapsed_labor(), 3);
}

#[test]
fn game_snapshot_restores_mid_production() {
    let rules = standard_rules();
    let lang = StringTable::new();
    let mut game = Game::new(10_000, EconomyConfig::default(), 5);
    let mut base = test_base();
    base.items.add(alloys(), 5);
    let id = game.add_base(base);
    game.start_order(id, &rules, laser_rifle_recipe(), 4).unwrap();
    game.set_assigned_workers(id, &rules, 0, 3).unwrap();
    for _ in 0..5 {
        game.advance_production(&rules, &lang);
    }

    let bytes = game.serialize().unwrap();
    let mut restored = Game::deserialize(&bytes).unwrap();
    assert_eq!(restored.hour(), 5);
    for _ in 0..10 {
        assert_eq!(
            game.advance_production(&rules, &lang),
            restored.advance_production(&rules, &lang)
        );
    }
    assert_eq!(game.economy, restored.economy);
    assert_eq!(game.base(id), restored.base(id));
}
