//! Part arena and clone/template resolution
//!
//! The [`Assembly`] owns every part in a single id-keyed store; template and
//! container relations between parts are ids, so nothing dangles while the
//! assembly lives. Child views are materialized lazily, one name at a time,
//! and cached per container. World poses are never stored; they are composed
//! on demand by walking the container chain.

use std::collections::{BTreeSet, HashMap};

use glam::DVec3;

use crate::part::{Part, PartId};
use crate::pose::{Angle, Axis, Frame, Pose};
use crate::style::{Style, StyleSheet};

/// A drawable leaf produced by traversal, with its resolved style
///
/// `part` is the leaf (or, for pose markers, the grouping part itself —
/// recognizable by its `Group` kind) and `owner` the part that produced it.
#[derive(Debug, Clone)]
pub struct Primitive {
    pub part: PartId,
    pub world_pose: Pose,
    pub style: Style,
    pub owner: PartId,
}

/// Arena of parts forming one or more assembly trees
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    parts: HashMap<PartId, Part>,
}

impl Assembly {
    /// Create an empty assembly
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a free-standing part, returning its id
    pub fn add_part(&mut self, part: Part) -> PartId {
        let id = part.id;
        self.parts.insert(id, part);
        id
    }

    /// Get a part by id
    pub fn get(&self, id: PartId) -> Result<&Part, AssemblyError> {
        self.parts.get(&id).ok_or(AssemblyError::PartNotFound(id))
    }

    /// Get a mutable part by id
    pub fn get_mut(&mut self, id: PartId) -> Result<&mut Part, AssemblyError> {
        self.parts
            .get_mut(&id)
            .ok_or(AssemblyError::PartNotFound(id))
    }

    pub fn contains_part(&self, id: PartId) -> bool {
        self.parts.contains_key(&id)
    }

    /// Number of parts in the arena (definitions, clones and views alike)
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Define a child of `parent` under `name`
    ///
    /// An existing definition under the same name is replaced and its cached
    /// view dropped.
    pub fn add_child(
        &mut self,
        parent: PartId,
        name: &str,
        child: Part,
    ) -> Result<PartId, AssemblyError> {
        self.get(parent)?;
        let child_id = child.id;
        let mut child = child;
        child.container = Some(parent);
        self.parts.insert(child_id, child);

        let parent_node = self.get_mut(parent)?;
        if parent_node.parts.insert(name, child_id).is_some() {
            tracing::warn!(parent = %parent, name, "replaced existing child definition");
        }
        parent_node.cached.remove(name);
        Ok(child_id)
    }

    /// Define a child of `parent` as a clone of `template` at the given pose
    pub fn add_child_with_template(
        &mut self,
        parent: PartId,
        name: &str,
        pose: Pose,
        template: PartId,
    ) -> Result<PartId, AssemblyError> {
        self.get(parent)?;
        let child = self.clone_part(template, Some(parent))?;
        {
            let node = self.get_mut(child)?;
            node.local_pose = pose;
            node.name = Some(name.to_string());
        }
        let parent_node = self.get_mut(parent)?;
        if parent_node.parts.insert(name, child).is_some() {
            tracing::warn!(parent = %parent, name, "replaced existing child definition");
        }
        parent_node.cached.remove(name);
        Ok(child)
    }

    /// Remove a child definition (own entries only) and its cached view
    pub fn remove_child(&mut self, parent: PartId, name: &str) -> Result<PartId, AssemblyError> {
        let parent_node = self.get_mut(parent)?;
        let removed = parent_node
            .parts
            .remove(name)
            .ok_or_else(|| AssemblyError::ChildNotFound {
                part: parent,
                name: name.to_string(),
            })?;
        parent_node.cached.remove(name);
        Ok(removed)
    }

    /// Attach or clear a part's template, rejecting cyclic chains
    pub fn set_template(
        &mut self,
        part: PartId,
        template: Option<PartId>,
    ) -> Result<(), AssemblyError> {
        if let Some(template_id) = template {
            self.get(template_id)?;
            if self.template_chain_contains(template_id, part)? {
                return Err(AssemblyError::TemplateCycle(part));
            }
        }
        let node = self.get_mut(part)?;
        node.template = template;
        node.parts.set_proxy(template);
        // views resolved through the old template are stale
        node.cached.clear();
        Ok(())
    }

    /// Drop cached views cloned from `definition`, everywhere
    ///
    /// Called after a definition's local pose changes so later lookups
    /// materialize against the new pose.
    fn invalidate_views_of(&mut self, definition: PartId) {
        let stale: Vec<PartId> = self
            .parts
            .values()
            .filter(|p| p.template == Some(definition))
            .map(|p| p.id)
            .collect();
        if stale.is_empty() {
            return;
        }
        for node in self.parts.values_mut() {
            node.cached.retain(|_, view| !stale.contains(view));
        }
    }

    fn template_chain_contains(
        &self,
        start: PartId,
        needle: PartId,
    ) -> Result<bool, AssemblyError> {
        let mut visited = Vec::new();
        let mut current = Some(start);
        while let Some(id) = current {
            if id == needle {
                return Ok(true);
            }
            if visited.contains(&id) {
                return Err(AssemblyError::TemplateCycle(id));
            }
            visited.push(id);
            current = self.get(id)?.template;
        }
        Ok(false)
    }

    /// Resolve a child name to its defining part: own entry first, then the
    /// template chain
    pub fn lookup(&self, part: PartId, name: &str) -> Result<PartId, AssemblyError> {
        let mut visited = Vec::new();
        let mut current = part;
        loop {
            if visited.contains(&current) {
                return Err(AssemblyError::TemplateCycle(current));
            }
            visited.push(current);
            let node = self.get(current)?;
            if let Some(id) = node.parts.get_own(name) {
                return Ok(id);
            }
            match node.parts.proxy() {
                Some(next) => current = next,
                None => {
                    return Err(AssemblyError::ChildNotFound {
                        part,
                        name: name.to_string(),
                    });
                }
            }
        }
    }

    /// True if the name resolves through own entries or the template chain
    pub fn contains(&self, part: PartId, name: &str) -> Result<bool, AssemblyError> {
        match self.lookup(part, name) {
            Ok(_) => Ok(true),
            Err(AssemblyError::ChildNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Union of own and inherited child names, own entries taking precedence
    pub fn child_names(&self, part: PartId) -> Result<Vec<String>, AssemblyError> {
        let mut names = BTreeSet::new();
        let mut visited = Vec::new();
        let mut current = Some(part);
        while let Some(id) = current {
            if visited.contains(&id) {
                return Err(AssemblyError::TemplateCycle(id));
            }
            visited.push(id);
            let node = self.get(id)?;
            for name in node.parts.own_names() {
                names.insert(name.to_string());
            }
            current = node.parts.proxy();
        }
        Ok(names.into_iter().collect())
    }

    /// Materialize a lazy clone of `template` under `container`
    ///
    /// The clone starts with an empty own map proxying the template, a deep
    /// copy of its local pose, and no cache entries; the template's subtree
    /// is never copied eagerly.
    pub fn clone_part(
        &mut self,
        template: PartId,
        container: Option<PartId>,
    ) -> Result<PartId, AssemblyError> {
        let (kind, name, pose, style) = {
            let source = self.get(template)?;
            (
                source.kind.clone(),
                source.name.clone(),
                source.local_pose,
                source.style.clone(),
            )
        };
        let mut part = Part::new(kind);
        part.name = name;
        part.local_pose = pose;
        part.style = style;
        part.template = Some(template);
        part.parts.set_proxy(Some(template));
        part.container = container;
        let id = part.id;
        self.parts.insert(id, part);
        tracing::debug!(template = %template, clone = %id, "materialized clone");
        Ok(id)
    }

    /// Child view under this exact container: cached if already resolved,
    /// otherwise a fresh clone of the defining entry
    pub fn get_child(&mut self, part: PartId, name: &str) -> Result<PartId, AssemblyError> {
        if let Some(&cached) = self.get(part)?.cached.get(name) {
            return Ok(cached);
        }
        let definition = self.lookup(part, name)?;
        let view = self.clone_part(definition, Some(part))?;
        self.get_mut(part)?.cached.insert(name.to_string(), view);
        Ok(view)
    }

    /// Pose of a part in the root frame, composed up the container chain
    pub fn world_pose(&self, part: PartId) -> Result<Pose, AssemblyError> {
        let mut chain = Vec::new();
        let mut current = Some(part);
        while let Some(id) = current {
            if chain.contains(&id) {
                return Err(AssemblyError::ContainerCycle(id));
            }
            chain.push(id);
            current = self.get(id)?.container;
        }
        let mut pose = Pose::IDENTITY;
        for id in chain.into_iter().rev() {
            pose = pose.compose(&self.get(id)?.local_pose);
        }
        Ok(pose)
    }

    /// Deep-materialize the named child as an independent copy
    ///
    /// The copy's own map is the flattened effective map of the resolved
    /// child (each entry re-cloned one level), its template link is cleared,
    /// and it replaces the definition and cached view under `name`.
    pub fn edit(&mut self, part: PartId, name: &str) -> Result<PartId, AssemblyError> {
        let view = self.get_child(part, name)?;
        let names = self.child_names(view)?;

        let (kind, view_name, pose, style) = {
            let node = self.get(view)?;
            (
                node.kind.clone(),
                node.name.clone(),
                node.local_pose,
                node.style.clone(),
            )
        };
        let mut edited = Part::new(kind);
        edited.name = view_name;
        edited.local_pose = pose;
        edited.style = style;
        edited.container = Some(part);
        let edited_id = edited.id;
        self.parts.insert(edited_id, edited);

        for child_name in &names {
            let definition = self.lookup(view, child_name)?;
            let child = self.clone_part(definition, Some(edited_id))?;
            self.get_mut(edited_id)?.parts.insert(child_name.as_str(), child);
        }

        let parent = self.get_mut(part)?;
        parent.parts.insert(name, edited_id);
        parent.cached.remove(name);
        tracing::debug!(part = %edited_id, name, "materialized independent copy");
        Ok(edited_id)
    }

    /// Translate a part's local pose in place
    ///
    /// Cached views cloned from this part are dropped so they re-materialize
    /// against the new pose.
    pub fn translate_part(
        &mut self,
        part: PartId,
        delta: DVec3,
        frame: Frame,
    ) -> Result<(), AssemblyError> {
        self.get_mut(part)?.local_pose.translate(delta, frame);
        self.invalidate_views_of(part);
        Ok(())
    }

    /// Rotate a part's local pose in place (body frame)
    ///
    /// Cached views cloned from this part are dropped so they re-materialize
    /// against the new pose.
    pub fn rotate_part(
        &mut self,
        part: PartId,
        axis: Axis,
        angle: Angle,
    ) -> Result<(), AssemblyError> {
        self.get_mut(part)?.local_pose.rotate(axis, angle);
        self.invalidate_views_of(part);
        Ok(())
    }

    /// Outline vertices of a part mapped to world coordinates
    pub fn world_points(&self, part: PartId) -> Result<Vec<DVec3>, AssemblyError> {
        let node = self.get(part)?;
        let world = self.world_pose(part)?;
        Ok(node
            .kind
            .outline_points()
            .into_iter()
            .map(|p| world.transform_point(p))
            .collect())
    }

    /// Depth-first traversal yielding `(primitive, resolved style, owner)`
    /// for every visible leaf, plus pose markers for grouping parts whose
    /// resolved style sets `draw_pose`
    ///
    /// Takes `&mut self` because traversal materializes child views.
    pub fn get_primitives(
        &mut self,
        part: PartId,
        sheet: &StyleSheet,
    ) -> Result<Vec<Primitive>, AssemblyError> {
        let mut out = Vec::new();
        self.collect_primitives(part, sheet, &Style::default(), &mut out)?;
        Ok(out)
    }

    fn collect_primitives(
        &mut self,
        part: PartId,
        sheet: &StyleSheet,
        inherited: &Style,
        out: &mut Vec<Primitive>,
    ) -> Result<(), AssemblyError> {
        let (class, name, local_style, is_primitive) = {
            let node = self.get(part)?;
            (
                node.class_name(),
                node.name.clone(),
                node.style.clone(),
                node.kind.is_primitive(),
            )
        };
        let mut style = inherited.merge(&sheet.resolve(class, name.as_deref()));
        if let Some(own) = &local_style {
            style = style.merge(own);
        }
        if !style.visible() {
            return Ok(());
        }
        if is_primitive {
            out.push(Primitive {
                part,
                world_pose: self.world_pose(part)?,
                style,
                owner: part,
            });
            return Ok(());
        }
        if style.draw_subparts() {
            for child_name in self.child_names(part)? {
                let child = self.get_child(part, &child_name)?;
                self.collect_primitives(child, sheet, &style, out)?;
            }
        }
        if style.draw_pose() {
            out.push(Primitive {
                part,
                world_pose: self.world_pose(part)?,
                style,
                owner: part,
            });
        }
        Ok(())
    }
}

/// Assembly-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum AssemblyError {
    #[error("part not found: {0}")]
    PartNotFound(PartId),
    #[error("part {part} has no child named '{name}'")]
    ChildNotFound { part: PartId, name: String },
    #[error("template chain of {0} is cyclic")]
    TemplateCycle(PartId),
    #[error("container chain of {0} is cyclic")]
    ContainerCycle(PartId),
}
