use serde_yaml::{Mapping, Value};

use crate::{
    manifest::{Image, Overlay, Str},
    resmap::Resources,
};

use super::Transformer;

/// Collects every image reference found in `containers`/`initContainers`
/// lists, anywhere in a document, and records one pin per image name in the
/// overlay descriptor. First occurrence wins; the final list is sorted by
/// the pinned reference string.
#[derive(Default)]
pub struct ImageTransformer(());

impl Transformer for ImageTransformer {
    fn name(&self) -> &'static str {
        "image"
    }

    #[tracing::instrument(skip_all, name = "image_transform")]
    fn transform(
        &mut self,
        overlay: &mut Overlay,
        resources: &mut Resources,
    ) -> anyhow::Result<()> {
        for resource in resources.map.iter() {
            find_images(resource.root(), &mut overlay.images);
        }

        overlay.images.sort_by_key(image_string);

        Ok(())
    }
}

fn find_images(map: &Mapping, images: &mut Vec<Image>) {
    for (key, value) in map {
        if let Value::Sequence(containers) = value {
            if matches!(key.as_str(), Some("containers" | "initContainers")) {
                collect_container_images(containers, images);
            }
        }

        match value {
            Value::Mapping(submap) => find_images(submap, images),
            Value::Sequence(seq) => {
                for item in seq {
                    if let Value::Mapping(submap) = item {
                        find_images(submap, images);
                    }
                }
            }
            _ => {}
        }
    }
}

fn collect_container_images(containers: &[Value], images: &mut Vec<Image>) {
    for container in containers {
        let Some(image_ref) = container
            .as_mapping()
            .and_then(|container| container.get("image"))
            .and_then(Value::as_str)
        else {
            continue;
        };

        let image = parse_image(image_ref);
        if images.iter().any(|existing| existing.name == image.name) {
            continue;
        }

        tracing::debug!("pinning image `{image_ref}`");
        images.push(image);
    }
}

/// Splits a reference on the last `@` (digest form) or else the last `:`
/// (tag form), so registry hosts carrying a port stay part of the name.
fn parse_image(image_ref: &str) -> Image {
    if let Some((name, digest)) = image_ref.rsplit_once('@') {
        return Image {
            name: name.into(),
            digest: digest.into(),
            ..Default::default()
        };
    }

    match image_ref.rsplit_once(':') {
        Some((name, tag)) => Image {
            name: name.into(),
            new_tag: tag.into(),
            ..Default::default()
        },
        None => Image {
            name: image_ref.into(),
            ..Default::default()
        },
    }
}

fn image_string(image: &Image) -> Str {
    if image.digest.is_empty() {
        compact_str::format_compact!("{}:{}", image.name, image.new_tag)
    } else {
        compact_str::format_compact!("{}@{}", image.name, image.digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resmap::ResourceMap;

    fn resources(docs: &[&str]) -> Resources {
        let mut map = ResourceMap::default();
        for doc in docs {
            map.insert(serde_yaml::from_str(doc).expect("valid test resource"))
                .expect("unique test resource ids");
        }
        Resources {
            map,
            ..Default::default()
        }
    }

    fn run(resources: &mut Resources) -> Vec<Image> {
        let mut overlay = Overlay::default();
        ImageTransformer::default()
            .transform(&mut overlay, resources)
            .unwrap();
        overlay.images
    }

    #[test]
    fn pins_tag_digest_and_bare_references() {
        let mut resources = resources(&[r#"
kind: Pod
metadata:
  name: pod
spec:
  containers:
    - name: web
      image: nginx:1.7.9
    - name: base
      image: "alpine@sha256:24a0c4b4a4c0eb97a1aabb8e29f18e917d05abfe1b7a7c07857230879ce7d3d3"
  initContainers:
    - name: init
      image: busybox
"#]);

        let images = run(&mut resources);

        assert_eq!(
            images,
            vec![
                Image {
                    name: "alpine".into(),
                    digest:
                        "sha256:24a0c4b4a4c0eb97a1aabb8e29f18e917d05abfe1b7a7c07857230879ce7d3d3"
                            .into(),
                    ..Default::default()
                },
                Image {
                    name: "busybox".into(),
                    ..Default::default()
                },
                Image {
                    name: "nginx".into(),
                    new_tag: "1.7.9".into(),
                    ..Default::default()
                },
            ]
        );
    }

    #[test]
    fn registry_port_stays_in_the_name() {
        assert_eq!(
            parse_image("localhost:5000/nginx:1.7.9"),
            Image {
                name: "localhost:5000/nginx".into(),
                new_tag: "1.7.9".into(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn digest_split_wins_over_tag_split() {
        let image = parse_image("registry.example.com:443/app@sha256:abc");
        assert_eq!(image.name, "registry.example.com:443/app");
        assert_eq!(image.digest, "sha256:abc");
        assert!(image.new_tag.is_empty());
    }

    #[test]
    fn first_occurrence_wins_per_name() {
        let mut resources = resources(&[
            "kind: Pod\nmetadata: {name: a}\nspec:\n  containers:\n    - image: redis:6",
            "kind: Pod\nmetadata: {name: b}\nspec:\n  containers:\n    - image: redis:7",
        ]);

        let images = run(&mut resources);

        assert_eq!(images.len(), 1);
        assert_eq!(images[0].new_tag, "6");
    }

    #[test]
    fn finds_nested_pod_templates() {
        let mut resources = resources(&[r#"
kind: Deployment
metadata:
  name: deep
spec:
  template:
    spec:
      containers:
        - image: web:1.0
"#]);

        let images = run(&mut resources);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].name, "web");
    }
}
