//! Trigger condition of a spawn point.
//!
use crate::definition::SpawnPointDefinition;
use crate::world::{Filters, MatchState, Regions};

/// True if at least one actor of the match stands inside the definition's player region and is
/// accepted by its filter.
///
/// Evaluated fresh on every trigger attempt.
pub fn evaluate<H>(definition: &SpawnPointDefinition, host: &H) -> bool
where
    H: Regions + Filters + MatchState + ?Sized,
{
    let region = definition.player_region();
    let filter = definition.filter();
    host.actors()
        .iter()
        .filter(|actor| host.contains(region, &actor.location))
        .any(|actor| filter.query(host, actor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::TriggerFilter;
    use crate::model::{Actor, FilterId, Location, RegionId};
    use crate::sandbox::{Cuboid, Sandbox};

    fn setup(filter: TriggerFilter) -> (Sandbox, SpawnPointDefinition) {
        let mut host = Sandbox::default();
        host.add_region(
            RegionId(1),
            Cuboid::new(Location::new(0., 0., 0.), Location::new(10., 10., 10.)),
        );
        let def = SpawnPointDefinition::builder()
            .with_spawn_region(RegionId(1))
            .with_player_region(RegionId(1))
            .with_filter(filter)
            .build()
            .expect("build");
        (host, def)
    }

    #[test]
    fn no_actors_is_not_occupied() {
        let (host, def) = setup(TriggerFilter::Allow);
        assert!(!evaluate(&def, &host));
    }

    #[test]
    fn actor_outside_of_the_region_does_not_count() {
        let (mut host, def) = setup(TriggerFilter::Allow);
        host.add_actor(Actor::new(Location::new(50., 0., 0.)));
        assert!(!evaluate(&def, &host));
    }

    #[test]
    fn actor_inside_of_the_region_triggers() {
        let (mut host, def) = setup(TriggerFilter::Allow);
        host.add_actor(Actor::new(Location::new(50., 0., 0.)));
        host.add_actor(Actor::new(Location::new(5., 5., 5.)));
        assert!(evaluate(&def, &host));
    }

    #[test]
    fn filter_has_to_accept_an_occupant() {
        let (mut host, def) = setup(TriggerFilter::Custom(FilterId(7)));
        let inside = Actor::new(Location::new(5., 5., 5.));
        let outside = Actor::new(Location::new(50., 5., 5.));
        let accepted = outside.id;
        host.add_actor(inside);
        host.add_actor(outside);
        // only the actor outside of the region passes the filter
        host.add_filter(FilterId(7), move |actor: &Actor| actor.id == accepted);

        assert!(!evaluate(&def, &host));

        let (mut host, def) = setup(TriggerFilter::Deny);
        host.add_actor(Actor::new(Location::new(5., 5., 5.)));
        assert!(!evaluate(&def, &host));
    }

    #[test]
    fn unknown_filter_rejects() {
        let (mut host, def) = setup(TriggerFilter::Custom(FilterId(3)));
        host.add_actor(Actor::new(Location::new(5., 5., 5.)));
        assert!(!evaluate(&def, &host));
    }
}
